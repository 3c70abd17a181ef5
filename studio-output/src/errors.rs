// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by studio-output.
//!
//! Interpreting output never fails: unparseable lines simply leave the state
//! unchanged. The errors here come from the edges around the interpreter, such
//! as loading configuration.

use crate::classify::LineType;
use camino::{FromPathBufError, Utf8PathBuf};
use thiserror::Error;

/// Error returned while parsing a [`LineType`] from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized line type: {input} (known values: {})",
    LineType::variants().join(", "),
)]
pub struct LineTypeParseError {
    input: String,
}

impl LineTypeParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurred while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file was explicitly specified but does not exist.
    #[error("config file not found at {path}")]
    FileNotFound {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// The config file could not be read.
    #[error("failed to read config file at {path}")]
    Read {
        /// The path that was read.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// The config file could not be parsed.
    #[error("failed to parse config file at {path}")]
    Parse {
        /// The path that was parsed.
        path: Utf8PathBuf,

        /// The underlying TOML error.
        #[source]
        error: toml::de::Error,
    },

    /// The config directory is not valid UTF-8.
    #[error("config directory is not valid UTF-8")]
    NonUtf8Path {
        /// The underlying conversion error.
        #[source]
        error: FromPathBufError,
    },
}
