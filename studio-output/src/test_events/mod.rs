// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured test event parsing.
//!
//! A test runner's output is folded, one line at a time, into a
//! [`TestSuiteResult`]. Two formats are understood:
//!
//! * libtest's JSON lines (`--format json`), e.g.
//!   `{ "type": "test", "event": "ok", "name": "tests::a", "exec_time": 0.01 }`;
//! * the human-readable text format, e.g. `test tests::a ... ok`.
//!
//! Every line is first tried as JSON. Only lines that are not valid JSON at all
//! fall back to the text patterns. Lines that match nothing leave the state
//! unchanged, since process output is noisy and uncontrolled.
//!
//! ```
//! use studio_output::test_events::{SuiteStatus, TestSuiteResult, parse_line};
//!
//! let mut state = TestSuiteResult::new();
//! for line in [
//!     "running 1 test",
//!     "test tests::smoke ... ok",
//!     "test result: ok. 1 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.01s",
//! ] {
//!     state = parse_line(&state, line);
//! }
//! assert_eq!(state.status, SuiteStatus::Completed);
//! assert_eq!(state.passed, 1);
//! ```

mod duration;
mod event;
mod suite;

pub use duration::*;
pub use event::*;
pub use suite::*;

/// Folds a single line of test runner output into `state`, returning the new
/// state.
///
/// `state` is not modified. Lines that are empty, unparseable or
/// unrecognized produce a state equal to `state`.
pub fn parse_line(state: &TestSuiteResult, line: &str) -> TestSuiteResult {
    state.apply(LineEvent::parse(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_strategy::proptest;

    fn parse_all(input: &str) -> TestSuiteResult {
        input
            .lines()
            .fold(TestSuiteResult::new(), |state, line| parse_line(&state, line))
    }

    #[test]
    fn json_run() {
        let state = parse_all(indoc! {r#"
            {"type":"suite","event":"started","test_count":2}
            {"type":"test","event":"started","name":"t1"}
            {"type":"test","event":"ok","name":"t1","exec_time":0.01}
            {"type":"test","event":"started","name":"t2"}
            {"type":"test","event":"failed","name":"t2","exec_time":0.02,"stdout":"assertion failed"}
            {"type":"suite","event":"failed","passed":1,"failed":1,"ignored":0,"exec_time":0.05}
        "#});

        assert_eq!(state.status, SuiteStatus::Completed);
        assert_eq!(state.total_tests, 2);
        assert_eq!((state.passed, state.failed, state.ignored), (1, 1, 0));
        assert_eq!(state.duration, Some(0.05));

        let t1 = state.test("t1").unwrap();
        assert_eq!(t1.status, TestStatus::Passed);
        assert_eq!(t1.duration, Some(0.01));
        assert_eq!(t1.message, None);

        let t2 = state.test("t2").unwrap();
        assert_eq!(t2.status, TestStatus::Failed);
        assert_eq!(t2.message.as_deref(), Some("assertion failed"));
        assert_eq!(t2.stdout.as_deref(), Some("assertion failed"));
    }

    #[test]
    fn text_run() {
        let state = parse_all(indoc! {"
            running 3 tests
            test mod::a ... ok
            test mod::b ... FAILED
            test mod::c ... ignored
            test result: FAILED. 1 passed; 1 failed; 1 ignored
        "});

        assert_eq!(state.total_tests, 3);
        assert_eq!(state.status, SuiteStatus::Completed);
        assert_eq!((state.passed, state.failed, state.ignored), (1, 1, 1));
        assert_eq!(state.duration, None);
        assert_eq!(state.test("mod::b").unwrap().status, TestStatus::Failed);
    }

    #[test]
    fn cargo_test_output_with_noise() {
        let state = parse_all(indoc! {"
               Compiling counter v0.1.0 (/work/counter)
                Finished `test` profile [unoptimized + debuginfo] target(s) in 1.92s
                 Running unittests src/lib.rs (target/debug/deps/counter-0a1b2c)

            running 2 tests
            test tests::increments ... ok
            test tests::overflows ... FAILED

            failures:

            ---- tests::overflows stdout ----
            thread 'tests::overflows' panicked at src/lib.rs:40:9:
            attempt to add with overflow

            failures:
                tests::overflows

            test result: FAILED. 1 passed; 1 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.00s

                 Running tests/integration.rs (target/debug/deps/integration-3d4e5f)

            running 1 test
            test deploys ... ok

            test result: ok. 1 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.12s
        "});

        // The last summary is authoritative.
        assert_eq!(state.status, SuiteStatus::Completed);
        assert_eq!(state.total_tests, 3);
        assert_eq!((state.passed, state.failed, state.ignored), (1, 0, 0));
        assert_eq!(state.duration, Some(0.12));
        assert_eq!(state.tests().len(), 3);
        assert_eq!(
            state.test("tests::overflows").unwrap().status,
            TestStatus::Failed
        );
    }

    #[test]
    fn repeated_text_result_counts_once() {
        let state = parse_all("test foo::bar ... ok\ntest foo::bar ... ok");
        assert_eq!(state.passed, 1);
    }

    #[test]
    fn repeated_json_result_counts_twice() {
        // Only the text format guards against repeated results.
        let line = r#"{"type":"test","event":"ok","name":"foo::bar"}"#;
        let state = parse_all(&format!("{line}\n{line}"));
        assert_eq!(state.passed, 2);
        assert_eq!(state.tests().len(), 1);
    }

    #[test]
    fn json_suite_completion_overwrites_counts() {
        let state = parse_all(indoc! {r#"
            {"type":"test","event":"ok","name":"a"}
            {"type":"suite","event":"ok","passed":5,"failed":0,"ignored":0,"exec_time":1.2}
        "#});
        assert_eq!(state.passed, 5);
        assert_eq!(state.duration, Some(1.2));
    }

    #[test]
    fn zero_and_absent_durations_differ() {
        let state = parse_all(indoc! {r#"
            {"type":"test","event":"ok","name":"fast","exec_time":0}
            {"type":"test","event":"ok","name":"untimed"}
        "#});
        assert_eq!(state.test("fast").unwrap().duration, Some(0.0));
        assert_eq!(state.test("untimed").unwrap().duration, None);
    }

    #[test]
    fn json_and_text_for_same_test_count_once() {
        let state = parse_all(indoc! {r#"
            {"type":"test","event":"failed","name":"dup","stdout":"boom"}
            test dup ... FAILED
        "#});
        assert_eq!(state.failed, 1);
        assert_eq!(state.test("dup").unwrap().message.as_deref(), Some("boom"));
    }

    #[test]
    fn without_completion_signal_stays_running() {
        let state = parse_all("running 2 tests\ntest a ... ok\ntest b ... ok");
        assert_eq!(state.status, SuiteStatus::Running);
        assert_eq!(state.passed, 2);
    }

    #[test]
    fn garbage_line_leaves_state_unchanged() {
        let state = parse_all("running 2 tests\ntest a ... ok");
        let next = parse_line(&state, "☢ not json, not a test line ☢");
        assert_eq!(next, state);
    }

    #[proptest(cases = 256)]
    fn parse_line_never_panics(
        #[strategy("[ -~☢\x1b]{0,64}")] line: String,
    ) {
        let state = TestSuiteResult::new();
        let next = parse_line(&state, &line);
        assert_eq!(state, TestSuiteResult::new());
        assert!(next.tests().len() <= 1);
    }
}
