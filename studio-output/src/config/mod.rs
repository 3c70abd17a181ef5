// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for output interpretation.
//!
//! ## Config file location
//!
//! The config file is searched for at `$XDG_CONFIG_HOME/studio-output/config.toml`,
//! falling back to `~/.config/studio-output/config.toml`. A path can also be
//! given explicitly, in which case it must exist.
//!
//! ## Configuration hierarchy
//!
//! Settings are resolved in the following order (highest priority first):
//!
//! 1. CLI arguments (e.g. `--show error,warning`)
//! 2. The config file
//! 3. Built-in defaults (`default-config.toml`)
//!
//! ## Example
//!
//! ```toml
//! [log]
//! max-retained-lines = 20000
//!
//! [log.show]
//! plain = false
//! ```

mod discovery;
mod imp;

pub use discovery::*;
pub use imp::*;
