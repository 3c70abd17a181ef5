// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, Palette};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use studio_output::errors::ConfigError;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Process exit codes returned by `studio-output`.
pub enum StudioExitCode {}

impl StudioExitCode {
    /// The command succeeded. For `tests`, the suite completed without
    /// failures.
    pub const OK: i32 = 0;

    /// No completion signal was seen in the test output.
    pub const NO_COMPLETION: i32 = 4;

    /// At least one test failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// An error occurred while loading configuration.
    pub const SETUP_ERROR: i32 = 96;

    /// An error occurred while reading input.
    pub const READ_INPUT_ERROR: i32 = 109;

    /// An error occurred while writing output.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

// The #[error()] strings are placeholder messages. Errors are printed with
// display_to_stderr, which styles them.

/// An expected error, reported to the user without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config error")]
    ConfigError {
        #[from]
        err: ConfigError,
    },
    #[error("error reading input")]
    ReadInputError {
        /// `None` for standard input.
        path: Option<Utf8PathBuf>,
        #[source]
        err: std::io::Error,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("error serializing output")]
    SerializeError {
        #[source]
        err: serde_json::Error,
    },
}

impl ExpectedError {
    pub(crate) fn read_input(path: Option<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::ReadInputError { path, err }
    }

    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigError { .. } => StudioExitCode::SETUP_ERROR,
            Self::ReadInputError { .. } => StudioExitCode::READ_INPUT_ERROR,
            Self::WriteOutputError { .. } | Self::SerializeError { .. } => {
                StudioExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, palette: &Palette) {
        let mut next_error = match self {
            Self::ConfigError { err } => match err {
                ConfigError::FileNotFound { path } => {
                    error!("config file not found at {}", path.style(palette.emphasis));
                    None
                }
                ConfigError::Read { path, error } => {
                    error!("failed to read config file at {}", path.style(palette.emphasis));
                    Some(error as &dyn Error)
                }
                ConfigError::Parse { path, error } => {
                    error!("failed to parse config file at {}", path.style(palette.emphasis));
                    Some(error as &dyn Error)
                }
                other => {
                    error!("error loading config");
                    Some(other as &dyn Error)
                }
            },
            Self::ReadInputError { path, err } => {
                match path {
                    Some(path) => {
                        error!("error reading input from {}", path.style(palette.emphasis))
                    }
                    None => error!("error reading input from standard input"),
                }
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
            Self::SerializeError { err } => {
                error!("error serializing test results to JSON");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
