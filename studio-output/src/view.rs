// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classified, filterable views over lines of output.
//!
//! A view is derived from the raw lines whenever they change; nothing here
//! stores state or modifies its input.

use crate::{
    ansi::strip_ansi,
    classify::{LineType, classify_stripped},
};
use serde::{Deserialize, Serialize};

/// A single classified line of output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLine {
    /// The 1-based position of the line in its buffer.
    pub line_number: usize,

    /// The line with ANSI escape sequences removed.
    pub content: String,

    /// The category the line was classified into.
    #[serde(rename = "type")]
    pub line_type: LineType,

    /// The original line, including any escape sequences, for re-display.
    pub raw_content: String,
}

impl ParsedLine {
    /// Strips and classifies `raw`, which is at position `line_number`.
    pub fn parse(line_number: usize, raw: &str) -> Self {
        let content = strip_ansi(raw).into_owned();
        let line_type = classify_stripped(&content, raw);
        Self {
            line_number,
            content,
            line_type,
            raw_content: raw.to_owned(),
        }
    }
}

/// Parses a sequence of raw lines, numbering them from 1.
pub fn parse_lines<I>(raw_lines: I) -> Vec<ParsedLine>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    raw_lines
        .into_iter()
        .enumerate()
        .map(|(index, raw)| ParsedLine::parse(index + 1, raw.as_ref()))
        .collect()
}

/// Which line types are shown.
///
/// Each type is toggled independently. The default shows everything.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct LineTypeFilter {
    /// Show error lines.
    pub error: bool,
    /// Show warning lines.
    pub warning: bool,
    /// Show info lines.
    pub info: bool,
    /// Show success lines.
    pub success: bool,
    /// Show plain lines.
    pub plain: bool,
}

impl LineTypeFilter {
    /// A filter that shows every line type.
    pub const ALL: Self = Self {
        error: true,
        warning: true,
        info: true,
        success: true,
        plain: true,
    };

    /// A filter that shows no line types.
    pub const NONE: Self = Self {
        error: false,
        warning: false,
        info: false,
        success: false,
        plain: false,
    };

    /// A filter that shows only `line_type`.
    pub fn only(line_type: LineType) -> Self {
        let mut filter = Self::NONE;
        filter.set(line_type, true);
        filter
    }

    /// Returns true if lines of `line_type` are shown.
    pub fn is_enabled(&self, line_type: LineType) -> bool {
        match line_type {
            LineType::Error => self.error,
            LineType::Warning => self.warning,
            LineType::Info => self.info,
            LineType::Success => self.success,
            LineType::Plain => self.plain,
        }
    }

    /// Shows or hides lines of `line_type`.
    pub fn set(&mut self, line_type: LineType, enabled: bool) {
        let slot = match line_type {
            LineType::Error => &mut self.error,
            LineType::Warning => &mut self.warning,
            LineType::Info => &mut self.info,
            LineType::Success => &mut self.success,
            LineType::Plain => &mut self.plain,
        };
        *slot = enabled;
    }
}

impl Default for LineTypeFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Returns the lines whose type is enabled in `filter` and, if `query` is
/// non-empty, whose stripped content contains `query` case-insensitively.
pub fn filter_and_search(
    lines: &[ParsedLine],
    filter: &LineTypeFilter,
    query: &str,
) -> Vec<ParsedLine> {
    let query = query.to_lowercase();
    lines
        .iter()
        .filter(|line| filter.is_enabled(line.line_type))
        .filter(|line| query.is_empty() || line.content.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Per-type line counts.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TypeCounts {
    /// The number of error lines.
    pub error: usize,
    /// The number of warning lines.
    pub warning: usize,
    /// The number of info lines.
    pub info: usize,
    /// The number of success lines.
    pub success: usize,
    /// The number of plain lines.
    pub plain: usize,
    /// The total number of lines.
    pub total: usize,
}

impl TypeCounts {
    /// Returns the count for `line_type`.
    pub fn get(&self, line_type: LineType) -> usize {
        match line_type {
            LineType::Error => self.error,
            LineType::Warning => self.warning,
            LineType::Info => self.info,
            LineType::Success => self.success,
            LineType::Plain => self.plain,
        }
    }
}

/// Counts lines by type, ignoring any filter.
pub fn count_by_type(lines: &[ParsedLine]) -> TypeCounts {
    lines.iter().fold(TypeCounts::default(), |mut counts, line| {
        match line.line_type {
            LineType::Error => counts.error += 1,
            LineType::Warning => counts.warning += 1,
            LineType::Info => counts.info += 1,
            LineType::Success => counts.success += 1,
            LineType::Plain => counts.plain += 1,
        }
        counts.total += 1;
        counts
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_strategy::proptest;

    fn sample() -> Vec<ParsedLine> {
        parse_lines([
            "   \x1b[1;32mCompiling\x1b[0m counter v0.1.0",
            "\x1b[1;33mwarning\x1b[0m: unused variable `x`",
            "error[E0425]: cannot find value `y`",
            "Downloading clarinet v2.0",
            "hello from the contract",
            "ERROR: deployment failed",
        ])
    }

    #[test]
    fn parse_numbers_and_strips() {
        let lines = sample();
        assert_eq!(
            lines[1],
            ParsedLine {
                line_number: 2,
                content: "warning: unused variable `x`".to_owned(),
                line_type: LineType::Warning,
                raw_content: "\x1b[1;33mwarning\x1b[0m: unused variable `x`".to_owned(),
            }
        );
        let numbers: Vec<_> = lines.iter().map(|line| line.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn filter_by_type() {
        let lines = sample();
        let errors = filter_and_search(&lines, &LineTypeFilter::only(LineType::Error), "");
        let numbers: Vec<_> = errors.iter().map(|line| line.line_number).collect();
        assert_eq!(numbers, vec![3, 6]);

        assert!(filter_and_search(&lines, &LineTypeFilter::NONE, "").is_empty());
        assert_eq!(filter_and_search(&lines, &LineTypeFilter::ALL, ""), lines);
    }

    #[test]
    fn search_is_case_insensitive_on_stripped_content() {
        let lines = sample();
        let found = filter_and_search(&lines, &LineTypeFilter::ALL, "COMPILING COUNTER");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_number, 1);

        // Escape sequences are not searchable.
        assert!(filter_and_search(&lines, &LineTypeFilter::ALL, "[1;32m").is_empty());
    }

    #[test]
    fn search_combines_with_filter() {
        let lines = sample();
        let mut filter = LineTypeFilter::ALL;
        filter.set(LineType::Error, false);
        let found = filter_and_search(&lines, &filter, "e");
        assert!(found.iter().all(|line| line.line_type != LineType::Error));
        assert!(!found.is_empty());
    }

    #[test]
    fn counts() {
        let counts = count_by_type(&sample());
        assert_eq!(
            counts,
            TypeCounts {
                error: 2,
                warning: 1,
                info: 1,
                success: 1,
                plain: 1,
                total: 6,
            }
        );
    }

    #[proptest(cases = 64)]
    fn counts_match_single_type_filters(
        #[strategy(proptest::collection::vec("[a-z \x1b\\[;0-9m]{0,24}", 0..24))] raw: Vec<String>,
    ) {
        let lines = parse_lines(&raw);
        let counts = count_by_type(&lines);
        let mut sum = 0;
        for line_type in LineType::ALL {
            let filtered = filter_and_search(&lines, &LineTypeFilter::only(line_type), "");
            assert_eq!(filtered.len(), counts.get(line_type));
            sum += filtered.len();
        }
        assert_eq!(sum, counts.total);
        assert_eq!(counts.total, lines.len());
    }

    #[proptest(cases = 64)]
    fn filter_keeps_only_enabled(
        filter: LineTypeFilter,
        #[strategy(proptest::collection::vec("[a-z ]{0,24}", 0..16))] raw: Vec<String>,
    ) {
        let lines = parse_lines(&raw);
        let filtered = filter_and_search(&lines, &filter, "");
        assert!(filtered.iter().all(|line| filter.is_enabled(line.line_type)));
        let expected = lines
            .iter()
            .filter(|line| filter.is_enabled(line.line_type))
            .count();
        assert_eq!(filtered.len(), expected);
    }
}
