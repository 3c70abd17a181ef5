// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ANSI escape sequence handling.

use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

/// Matches a single CSI sequence: `ESC [`, then digits and semicolons, then a
/// letter terminator.
static CSI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("CSI regex is valid"));

/// Removes every CSI escape sequence from `text`.
///
/// Only complete sequences of the form `ESC [ <digits and semicolons> <letter>`
/// are removed. All other bytes, including incomplete sequences such as a
/// trailing `ESC [3`, are left as they are.
///
/// Stripping is idempotent: removing a sequence can bring together the pieces
/// of another one (for example `ESC [ ESC[31m 31m`), so sequences are removed
/// until none are left.
///
/// Returns the input unchanged (and unallocated) if it contains no sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    loop {
        let next = match CSI_REGEX.replace_all(&out, "") {
            Cow::Owned(next) => next,
            Cow::Borrowed(_) => break,
        };
        out = Cow::Owned(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case("plain text", "plain text" ; "no sequences")]
    #[test_case("\x1b[31merror\x1b[0m: oops", "error: oops" ; "color and reset")]
    #[test_case("\x1b[1;32mCompiling\x1b[0m foo", "Compiling foo" ; "bold color")]
    #[test_case("\x1b[2Kprogress", "progress" ; "erase line")]
    #[test_case("\x1b[mreset", "reset" ; "no parameters")]
    #[test_case("cut off \x1b[3", "cut off \x1b[3" ; "incomplete sequence")]
    #[test_case("\x1b]0;title\x07text", "\x1b]0;title\x07text" ; "non-CSI sequence kept")]
    #[test_case("\x1b[\x1b[31m31mred", "red" ; "spliced sequence")]
    fn strip(input: &str, expected: &str) {
        assert_eq!(strip_ansi(input), expected);
    }

    #[test]
    fn strip_borrows_when_unchanged() {
        assert!(matches!(strip_ansi("nothing to do"), Cow::Borrowed(_)));
    }

    #[proptest]
    fn strip_is_idempotent(#[strategy("[a-z0-9;\\[\x1b m]{0,48}")] input: String) {
        let once = strip_ansi(&input).into_owned();
        let twice = strip_ansi(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[proptest]
    fn strip_keeps_text_without_escapes(#[strategy("[^\x1b]{0,48}")] input: String) {
        assert_eq!(strip_ansi(&input), input.as_str());
    }
}
