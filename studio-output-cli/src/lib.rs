// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line interface for interpreting build and test output.
//!
//! `studio-output log` prints a classified, filtered view of build output, and
//! `studio-output tests` summarizes the output of a libtest run in either its
//! JSON or human-readable format.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
