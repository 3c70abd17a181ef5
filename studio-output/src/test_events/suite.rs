// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test suite state.

use super::{LineEvent, SuiteCounts, TestOutcome};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

/// The status of a single test.
///
/// Tests move from `Pending` to `Running` to one of the terminal statuses.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Known but not yet started.
    Pending,
    /// Started but not finished.
    Running,
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Ignored.
    Ignored,
}

impl TestStatus {
    /// Returns true for `Passed`, `Failed` and `Ignored`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TestStatus::Passed | TestStatus::Failed | TestStatus::Ignored
        )
    }
}

/// The status of a whole suite.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteStatus {
    /// No completion signal has been seen yet.
    Running,
    /// A suite completion signal has been seen.
    Completed,
}

/// The result of a single named test.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// The test's name, such as `tests::parses_empty_input`.
    pub name: String,

    /// The test's current status.
    pub status: TestStatus,

    /// Execution time in seconds, if reported. Zero is a valid duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Captured output, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,

    /// Diagnostic text. Only set for failed tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestResult {
    fn new(name: String, status: TestStatus) -> Self {
        Self {
            name,
            status,
            duration: None,
            stdout: None,
            message: None,
        }
    }
}

/// A snapshot of a test run.
///
/// Snapshots are values: [`apply`](Self::apply) returns a new snapshot and
/// leaves the original untouched. The per-test map is shared between
/// snapshots until one of them changes it, so keeping old snapshots around is
/// cheap.
///
/// While the run is going, `passed`, `failed` and `ignored` count individual
/// results as they arrive. A suite completion event replaces them with the
/// totals it reports, so they need not add up to `total_tests`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteResult {
    /// Whether a completion signal has been seen.
    pub status: SuiteStatus,

    /// The number of tests announced.
    pub total_tests: u64,

    /// The number of tests that passed.
    pub passed: u64,

    /// The number of tests that failed.
    pub failed: u64,

    /// The number of tests that were ignored.
    pub ignored: u64,

    /// The suite's execution time in seconds, set on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    tests: Arc<BTreeMap<String, TestResult>>,
}

impl TestSuiteResult {
    /// Creates the state at the start of a run: running, with no tests.
    pub fn new() -> Self {
        Self {
            status: SuiteStatus::Running,
            total_tests: 0,
            passed: 0,
            failed: 0,
            ignored: 0,
            duration: None,
            tests: Arc::new(BTreeMap::new()),
        }
    }

    /// Returns all tests seen so far, keyed by name.
    pub fn tests(&self) -> &BTreeMap<String, TestResult> {
        &self.tests
    }

    /// Returns the test called `name`, if it has been seen.
    pub fn test(&self, name: &str) -> Option<&TestResult> {
        self.tests.get(name)
    }

    /// Returns true once a suite completion signal has been seen.
    pub fn is_completed(&self) -> bool {
        self.status == SuiteStatus::Completed
    }

    /// Returns the tests that have failed, in name order.
    pub fn failed_tests(&self) -> impl Iterator<Item = &TestResult> + '_ {
        self.tests
            .values()
            .filter(|test| test.status == TestStatus::Failed)
    }

    /// Applies a recognized line to this snapshot, returning the new snapshot.
    pub fn apply(&self, event: LineEvent) -> Self {
        let mut next = self.clone();
        match event {
            LineEvent::SuiteStarted { test_count } => {
                next.total_tests = test_count;
                next.status = SuiteStatus::Running;
            }
            LineEvent::SuiteFinished { counts, exec_time }
            | LineEvent::TextSuiteFinished { counts, exec_time } => {
                next.complete(counts, exec_time);
            }
            LineEvent::TestStarted { name } => {
                next.tests_mut()
                    .entry(name)
                    .and_modify(|test| test.status = TestStatus::Running)
                    .or_insert_with_key(|name| TestResult::new(name.clone(), TestStatus::Running));
            }
            LineEvent::TestFinished {
                name,
                outcome,
                exec_time,
                stdout,
            } => {
                // Repeated JSON completions for the same test are counted again.
                let status = outcome.status();
                let message = match outcome {
                    TestOutcome::Failed => stdout.clone(),
                    TestOutcome::Passed | TestOutcome::Ignored => None,
                };
                let test = next
                    .tests_mut()
                    .entry(name)
                    .or_insert_with_key(|name| TestResult::new(name.clone(), status));
                test.status = status;
                test.duration = exec_time;
                test.stdout = stdout;
                test.message = message;
                next.count(outcome);
            }
            LineEvent::TextTestResult { name, outcome } => {
                let already_finished = self
                    .tests
                    .get(&name)
                    .is_some_and(|test| test.status.is_terminal());
                if !already_finished {
                    let status = outcome.status();
                    next.tests_mut()
                        .entry(name)
                        .and_modify(|test| test.status = status)
                        .or_insert_with_key(|name| TestResult::new(name.clone(), status));
                    next.count(outcome);
                }
            }
            LineEvent::TextSuiteStarted { test_count } => {
                // Each test binary announces its own count.
                next.total_tests = next.total_tests.saturating_add(test_count);
            }
            LineEvent::Unrecognized => {}
        }
        next
    }

    fn tests_mut(&mut self) -> &mut BTreeMap<String, TestResult> {
        Arc::make_mut(&mut self.tests)
    }

    fn count(&mut self, outcome: TestOutcome) {
        let counter = match outcome {
            TestOutcome::Passed => &mut self.passed,
            TestOutcome::Failed => &mut self.failed,
            TestOutcome::Ignored => &mut self.ignored,
        };
        *counter = counter.saturating_add(1);
    }

    fn complete(&mut self, counts: SuiteCounts, exec_time: Option<f64>) {
        self.status = SuiteStatus::Completed;
        self.passed = counts.passed;
        self.failed = counts.failed;
        self.ignored = counts.ignored;
        self.duration = exec_time;
    }
}

impl Default for TestSuiteResult {
    fn default() -> Self {
        Self::new()
    }
}
