// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of the config file location.

use crate::errors::ConfigError;
use camino::Utf8PathBuf;
use etcetera::{BaseStrategy, HomeDirError, base_strategy::Xdg};

/// Returns the default config file path, `~/.config/studio-output/config.toml`
/// (or the equivalent under `$XDG_CONFIG_HOME`).
///
/// Returns `Ok(None)` if the home directory cannot be determined.
pub fn default_config_path() -> Result<Option<Utf8PathBuf>, ConfigError> {
    let strategy = match Xdg::new() {
        Ok(s) => s,
        Err(HomeDirError) => return Ok(None),
    };

    let config_path = strategy
        .config_dir()
        .join("studio-output")
        .join("config.toml");

    Utf8PathBuf::try_from(config_path)
        .map(Some)
        .map_err(|error| ConfigError::NonUtf8Path { error })
}
