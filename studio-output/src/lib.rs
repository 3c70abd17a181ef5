// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Interpreter for the output of compilation and test processes.
//!
//! Process output arrives as an append-only stream of text. This crate turns
//! that stream into typed data in two independent ways:
//!
//! * The [line classifier](classify) strips ANSI escape sequences and sorts
//!   each line into a [`LineType`](classify::LineType), producing
//!   [`ParsedLine`](view::ParsedLine) views that can be filtered and searched.
//! * The [test event parser](test_events) folds the output of a test runner,
//!   either libtest JSON lines or the human-readable text format, into a
//!   running [`TestSuiteResult`](test_events::TestSuiteResult).
//!
//! Both are pure functions over complete lines. Use a
//! [`LineBuffer`](line_buffer::LineBuffer) to turn arbitrarily split chunks
//! into lines, and an [`OutputLog`](output_log::OutputLog) to keep a bounded
//! window of them.

pub mod ansi;
pub mod classify;
pub mod config;
pub mod errors;
pub mod line_buffer;
pub mod output_log;
pub mod test_events;
pub mod view;
