// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recognition of individual lines of test runner output.

use super::TestStatus;
use crate::ansi::strip_ansi;
use regex::{Captures, Regex};
use serde::{Deserialize, de::IgnoredAny};
use serde_json::error::Category;
use std::sync::LazyLock;
use tracing::trace;

/// The outcome of a single finished test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestOutcome {
    /// The test passed (`ok`).
    Passed,
    /// The test failed (`failed` / `FAILED`).
    Failed,
    /// The test was ignored (`ignored`).
    Ignored,
}

impl TestOutcome {
    /// Returns the terminal status corresponding to this outcome.
    pub fn status(self) -> TestStatus {
        match self {
            TestOutcome::Passed => TestStatus::Passed,
            TestOutcome::Failed => TestStatus::Failed,
            TestOutcome::Ignored => TestStatus::Ignored,
        }
    }

    fn from_verdict(verdict: &str) -> Option<Self> {
        match verdict.to_ascii_lowercase().as_str() {
            "ok" => Some(TestOutcome::Passed),
            "failed" => Some(TestOutcome::Failed),
            "ignored" => Some(TestOutcome::Ignored),
            _ => None,
        }
    }
}

/// The totals reported when a suite finishes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SuiteCounts {
    /// The number of tests that passed.
    pub passed: u64,
    /// The number of tests that failed.
    pub failed: u64,
    /// The number of tests that were ignored.
    pub ignored: u64,
}

/// A single line of test runner output, recognized.
///
/// The `Text*` variants come from the human-readable format and are only
/// produced for lines that are not valid JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum LineEvent {
    /// `{ "type": "suite", "event": "started", "test_count": N }`
    SuiteStarted {
        /// The announced number of tests.
        test_count: u64,
    },

    /// `{ "type": "suite", "event": "ok" | "failed", "passed": P, ... }`
    SuiteFinished {
        /// The authoritative totals for the suite.
        counts: SuiteCounts,
        /// The suite's execution time in seconds, if reported.
        exec_time: Option<f64>,
    },

    /// `{ "type": "test", "event": "started", "name": "..." }`
    TestStarted {
        /// The test name.
        name: String,
    },

    /// `{ "type": "test", "event": "ok" | "failed" | "ignored", "name": "...", ... }`
    TestFinished {
        /// The test name.
        name: String,
        /// How the test finished.
        outcome: TestOutcome,
        /// The test's execution time in seconds, if reported.
        exec_time: Option<f64>,
        /// Captured output, if reported.
        stdout: Option<String>,
    },

    /// `test <name> ... ok | FAILED | ignored`
    TextTestResult {
        /// The test name.
        name: String,
        /// How the test finished.
        outcome: TestOutcome,
    },

    /// `running <N> tests`
    TextSuiteStarted {
        /// The announced number of tests.
        test_count: u64,
    },

    /// `test result: ok. <P> passed; <F> failed; <I> ignored; ...`
    TextSuiteFinished {
        /// The authoritative totals for the suite.
        counts: SuiteCounts,
        /// The `finished in <secs>s` time, if present.
        exec_time: Option<f64>,
    },

    /// Anything else, including valid JSON of an unknown shape.
    Unrecognized,
}

impl LineEvent {
    /// Recognizes a single complete line.
    ///
    /// This never fails: lines that are neither a known JSON event nor a known
    /// text pattern are [`LineEvent::Unrecognized`].
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return LineEvent::Unrecognized;
        }

        match serde_json::from_str::<LibtestLine>(line) {
            Ok(libtest) => libtest.into(),
            // Valid JSON that isn't a libtest event is handled at the JSON level.
            Err(error) if error.classify() == Category::Data && is_valid_json(line) => {
                trace!("ignoring unrecognized JSON line: {error}");
                LineEvent::Unrecognized
            }
            Err(_) => Self::parse_text(line),
        }
    }

    fn parse_text(line: &str) -> Self {
        let line = strip_ansi(line);
        parse_text_test_result(&line)
            .or_else(|| parse_text_suite_started(&line))
            .or_else(|| parse_text_suite_finished(&line))
            .unwrap_or(LineEvent::Unrecognized)
    }
}

// ---
// JSON (libtest `--format json`)
// ---

/// A type error can be reported before the whole line has been read (e.g. for
/// `1 passed`), so syntactic validity is checked separately.
fn is_valid_json(line: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(line).is_ok()
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LibtestLine {
    Suite(LibtestSuiteEvent),
    Test(LibtestTestEvent),
}

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum LibtestSuiteEvent {
    Started {
        #[serde(default)]
        test_count: u64,
    },
    Ok(LibtestSuiteSummary),
    Failed(LibtestSuiteSummary),
}

#[derive(Deserialize)]
struct LibtestSuiteSummary {
    #[serde(default)]
    passed: u64,
    #[serde(default)]
    failed: u64,
    #[serde(default)]
    ignored: u64,
    exec_time: Option<f64>,
}

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum LibtestTestEvent {
    Started { name: String },
    Ok(LibtestTestResult),
    Failed(LibtestTestResult),
    Ignored(LibtestTestResult),
}

#[derive(Deserialize)]
struct LibtestTestResult {
    name: String,
    exec_time: Option<f64>,
    stdout: Option<String>,
}

impl From<LibtestLine> for LineEvent {
    fn from(line: LibtestLine) -> Self {
        match line {
            LibtestLine::Suite(LibtestSuiteEvent::Started { test_count }) => {
                LineEvent::SuiteStarted { test_count }
            }
            LibtestLine::Suite(
                LibtestSuiteEvent::Ok(summary) | LibtestSuiteEvent::Failed(summary),
            ) => LineEvent::SuiteFinished {
                counts: SuiteCounts {
                    passed: summary.passed,
                    failed: summary.failed,
                    ignored: summary.ignored,
                },
                exec_time: valid_exec_time(summary.exec_time),
            },
            LibtestLine::Test(LibtestTestEvent::Started { name }) => {
                LineEvent::TestStarted { name }
            }
            LibtestLine::Test(LibtestTestEvent::Ok(result)) => {
                result.into_event(TestOutcome::Passed)
            }
            LibtestLine::Test(LibtestTestEvent::Failed(result)) => {
                result.into_event(TestOutcome::Failed)
            }
            LibtestLine::Test(LibtestTestEvent::Ignored(result)) => {
                result.into_event(TestOutcome::Ignored)
            }
        }
    }
}

impl LibtestTestResult {
    fn into_event(self, outcome: TestOutcome) -> LineEvent {
        LineEvent::TestFinished {
            name: self.name,
            outcome,
            exec_time: valid_exec_time(self.exec_time),
            stdout: self.stdout,
        }
    }
}

/// Durations are non-negative; zero is a valid (fast) duration.
fn valid_exec_time(exec_time: Option<f64>) -> Option<f64> {
    exec_time.filter(|secs| *secs >= 0.0)
}

// ---
// Text (libtest's human-readable output)
// ---

static TEST_RESULT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\btest\s+([\w:]+)\s+\.\.\.\s+(?i:(ok|failed|ignored))\b")
        .expect("test result regex is valid")
});

static SUITE_STARTED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\brunning\s+(\d+)\s+tests?\b").expect("suite started regex is valid")
});

static SUITE_FINISHED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"test result:\s*(?i:ok|failed)\s*\.?\s*(\d+)\s+passed\s*[;,]?\s*(\d+)\s+failed\s*[;,]?\s*(\d+)\s+ignored",
    )
    .expect("suite finished regex is valid")
});

static FINISHED_IN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"finished in\s+(\d+(?:\.\d+)?)s\b").expect("finished in regex is valid")
});

fn parse_text_test_result(line: &str) -> Option<LineEvent> {
    let captures = TEST_RESULT_REGEX.captures(line)?;
    Some(LineEvent::TextTestResult {
        name: captures[1].to_owned(),
        outcome: TestOutcome::from_verdict(&captures[2])?,
    })
}

fn parse_text_suite_started(line: &str) -> Option<LineEvent> {
    let captures = SUITE_STARTED_REGEX.captures(line)?;
    Some(LineEvent::TextSuiteStarted {
        test_count: parse_count(&captures, 1)?,
    })
}

fn parse_text_suite_finished(line: &str) -> Option<LineEvent> {
    let captures = SUITE_FINISHED_REGEX.captures(line)?;
    let counts = SuiteCounts {
        passed: parse_count(&captures, 1)?,
        failed: parse_count(&captures, 2)?,
        ignored: parse_count(&captures, 3)?,
    };
    let exec_time = FINISHED_IN_REGEX
        .captures(line)
        .and_then(|captures| captures[1].parse::<f64>().ok());
    Some(LineEvent::TextSuiteFinished { counts, exec_time })
}

/// Counts that don't fit in a `u64` make the line unrecognized.
fn parse_count(captures: &Captures<'_>, index: usize) -> Option<u64> {
    captures[index].parse().ok()
}
