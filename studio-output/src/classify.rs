// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of output lines into semantic categories.
//!
//! Classification is an ordered list of rules where the first matching rule
//! wins. Categories overlap (a compiler error can mention "compiling", and a
//! red line can say "warning"), so the order of the rules is significant:
//! errors are checked before warnings, warnings before successes, and
//! successes before informational lines.

use crate::{ansi::strip_ansi, errors::LineTypeParseError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The semantic category of a line of output.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum LineType {
    /// Errors, failures and panics.
    Error,

    /// Warnings.
    Warning,

    /// Informational progress such as downloads and builds.
    Info,

    /// Successful compilation or completion.
    Success,

    /// Anything else.
    Plain,
}

impl LineType {
    /// All line types, in display order.
    pub const ALL: [LineType; 5] = [
        LineType::Error,
        LineType::Warning,
        LineType::Info,
        LineType::Success,
        LineType::Plain,
    ];

    /// Returns the lowercase name of this line type.
    pub fn as_str(self) -> &'static str {
        match self {
            LineType::Error => "error",
            LineType::Warning => "warning",
            LineType::Info => "info",
            LineType::Success => "success",
            LineType::Plain => "plain",
        }
    }

    /// Returns the names of all line types.
    pub fn variants() -> [&'static str; 5] {
        Self::ALL.map(Self::as_str)
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineType {
    type Err = LineTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|line_type| line_type.as_str() == s)
            .ok_or_else(|| LineTypeParseError::new(s))
    }
}

struct ClassifyRule {
    line_type: LineType,
    /// Lowercase substrings searched for in the stripped, lowercased content.
    keywords: &'static [&'static str],
    /// SGR sequences searched for in the raw content.
    sgr: &'static [&'static str],
}

impl ClassifyRule {
    fn matches(&self, lowercase_content: &str, raw: &str) -> bool {
        self.keywords.iter().any(|k| lowercase_content.contains(k))
            || self.sgr.iter().any(|s| raw.contains(s))
    }
}

const RULES: [ClassifyRule; 4] = [
    ClassifyRule {
        line_type: LineType::Error,
        keywords: &["error", "failed", "panic"],
        sgr: &["\x1b[31m", "\x1b[1;31m"],
    },
    ClassifyRule {
        line_type: LineType::Warning,
        keywords: &["warning", "warn"],
        sgr: &["\x1b[33m", "\x1b[1;33m"],
    },
    ClassifyRule {
        line_type: LineType::Success,
        keywords: &["success", "finished", "compiled", "compiling"],
        sgr: &["\x1b[32m", "\x1b[1;32m"],
    },
    ClassifyRule {
        line_type: LineType::Info,
        keywords: &["[info]", "downloading", "building"],
        sgr: &["\x1b[36m", "\x1b[1;36m"],
    },
];

/// Classifies a raw line of output, which may contain ANSI escape sequences.
pub fn classify(raw: &str) -> LineType {
    classify_stripped(&strip_ansi(raw), raw)
}

/// Classifies a line whose stripped content has already been computed.
pub(crate) fn classify_stripped(content: &str, raw: &str) -> LineType {
    let lowercase = content.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowercase, raw))
        .map_or(LineType::Plain, |rule| rule.line_type)
}
