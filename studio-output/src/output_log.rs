// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A bounded window of raw output lines.

use crate::view::{ParsedLine, parse_lines};
use std::{collections::VecDeque, num::NonZeroUsize};

/// Retains the most recent lines of a build or test run.
///
/// Once more than `max_retained_lines` lines have been pushed, the oldest ones
/// are dropped. Line numbers in [`parsed_lines`](Self::parsed_lines) are
/// positions in the retained window, starting from 1.
#[derive(Clone, Debug)]
pub struct OutputLog {
    lines: VecDeque<String>,
    max_retained_lines: NonZeroUsize,
    dropped_lines: usize,
}

impl OutputLog {
    /// Creates an empty log that keeps at most `max_retained_lines` lines.
    pub fn new(max_retained_lines: NonZeroUsize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_retained_lines,
            dropped_lines: 0,
        }
    }

    /// Appends a complete raw line, evicting the oldest line if the log is full.
    pub fn push_line(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.max_retained_lines.get() {
            self.lines.pop_front();
            self.dropped_lines += 1;
        }
        self.lines.push_back(line.into());
    }

    /// The maximum number of lines retained.
    pub fn max_retained_lines(&self) -> NonZeroUsize {
        self.max_retained_lines
    }

    /// The number of lines currently retained.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines are retained.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The number of lines evicted so far.
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    /// Iterates over the retained raw lines, oldest first.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Classifies the retained lines.
    pub fn parsed_lines(&self) -> Vec<ParsedLine> {
        parse_lines(&self.lines)
    }

    /// Removes all retained lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.dropped_lines = 0;
    }
}

impl<S: Into<String>> Extend<S> for OutputLog {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for line in iter {
            self.push_line(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LineType;
    use pretty_assertions::assert_eq;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn keeps_most_recent_lines() {
        let mut log = OutputLog::new(cap(3));
        log.extend(["one", "two", "three", "four", "five"]);

        assert_eq!(log.len(), 3);
        assert_eq!(log.dropped_lines(), 2);
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["three", "four", "five"]);

        let parsed = log.parsed_lines();
        let numbers: Vec<_> = parsed.iter().map(|line| line.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(parsed[0].content, "three");
    }

    #[test]
    fn parsed_lines_are_classified() {
        let mut log = OutputLog::new(cap(10));
        log.push_line("\x1b[31merror\x1b[0m: boom");
        log.push_line("all good");

        let parsed = log.parsed_lines();
        assert_eq!(parsed[0].line_type, LineType::Error);
        assert_eq!(parsed[0].content, "error: boom");
        assert_eq!(parsed[1].line_type, LineType::Plain);
    }

    #[test]
    fn clear_resets() {
        let mut log = OutputLog::new(cap(1));
        log.extend(["a", "b"]);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.dropped_lines(), 0);
    }
}
