// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::discovery::default_config_path;
use crate::{classify::LineType, errors::ConfigError, output_log::OutputLog, view::LineTypeFilter};
use camino::Utf8Path;
use serde::Deserialize;
use std::{collections::BTreeSet, io, num::NonZeroUsize};
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// Special value for `--config-file` and `STUDIO_OUTPUT_CONFIG_FILE` that
/// skips config file loading entirely.
pub const CONFIG_NONE: &str = "none";

/// Specifies where to load configuration from.
#[derive(Clone, Copy, Debug)]
pub enum ConfigLocation<'a> {
    /// Discover the config file in the default location (e.g.
    /// `~/.config/studio-output/config.toml`).
    Default,

    /// Skip config file loading entirely, using only built-in defaults.
    Isolated,

    /// Load configuration from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

impl<'a> ConfigLocation<'a> {
    /// Creates a config location from a CLI or environment variable value.
    ///
    /// Returns `Default` if `None`, `Isolated` if `"none"`, otherwise
    /// `Explicit` with the path.
    pub fn from_cli_or_env(s: Option<&'a str>) -> Self {
        match s {
            None => Self::Default,
            Some(s) if s == CONFIG_NONE => Self::Isolated,
            Some(s) => Self::Explicit(Utf8Path::new(s)),
        }
    }
}

/// Configuration after the config file has been applied over the defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputConfig {
    /// The number of most recent raw lines an output log retains.
    pub max_retained_lines: NonZeroUsize,

    /// Line types shown by default.
    pub show: LineTypeFilter,
}

impl OutputConfig {
    /// Loads configuration from `location`, logging a warning for any unknown
    /// keys in the config file.
    pub fn load(location: ConfigLocation<'_>) -> Result<Self, ConfigError> {
        Self::load_with_warnings(location, &mut DefaultConfigWarnings)
    }

    /// Returns the built-in defaults, ignoring any config file.
    pub fn builtin() -> Self {
        Self::resolve(&DefaultConfig::from_embedded(), None)
    }

    /// Creates an empty output log using the configured retention.
    pub fn new_output_log(&self) -> OutputLog {
        OutputLog::new(self.max_retained_lines)
    }

    fn load_with_warnings(
        location: ConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        let user_config = DeserializedConfig::from_location(location, warnings)?;
        Ok(Self::resolve(
            &DefaultConfig::from_embedded(),
            user_config.as_ref(),
        ))
    }

    fn resolve(defaults: &DefaultConfig, user: Option<&DeserializedConfig>) -> Self {
        let mut max_retained_lines = defaults.log.max_retained_lines;
        let mut show = defaults.log.show;

        if let Some(user) = user {
            if let Some(max) = user.log.max_retained_lines {
                max_retained_lines = max;
            }
            user.log.show.apply_to(&mut show);
        }

        Self {
            max_retained_lines,
            show,
        }
    }
}

/// Trait for handling configuration warnings.
trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs configuration warnings through tracing.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if let (1, Some(key)) = (unknown.len(), unknown.first()) {
            swrite!(unknown_str, "key: {key}");
        } else {
            unknown_str.push_str("keys:\n");
            for key in unknown {
                swrite!(unknown_str, "\n  - {key}");
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// The config file as written by the user. Every setting is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    #[serde(default)]
    log: DeserializedLogConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedLogConfig {
    #[serde(default)]
    max_retained_lines: Option<NonZeroUsize>,

    #[serde(default)]
    show: DeserializedShowConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct DeserializedShowConfig {
    #[serde(default)]
    error: Option<bool>,
    #[serde(default)]
    warning: Option<bool>,
    #[serde(default)]
    info: Option<bool>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    plain: Option<bool>,
}

impl DeserializedShowConfig {
    fn apply_to(&self, filter: &mut LineTypeFilter) {
        let settings = [
            (LineType::Error, self.error),
            (LineType::Warning, self.warning),
            (LineType::Info, self.info),
            (LineType::Success, self.success),
            (LineType::Plain, self.plain),
        ];
        for (line_type, enabled) in settings {
            if let Some(enabled) = enabled {
                filter.set(line_type, enabled);
            }
        }
    }
}

impl DeserializedConfig {
    fn from_location(
        location: ConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Option<Self>, ConfigError> {
        match location {
            ConfigLocation::Isolated => {
                debug!("config: skipping config file (isolated)");
                Ok(None)
            }
            ConfigLocation::Explicit(path) => match Self::from_path(path, warnings)? {
                Some(config) => Ok(Some(config)),
                None => Err(ConfigError::FileNotFound {
                    path: path.to_owned(),
                }),
            },
            ConfigLocation::Default => match default_config_path()? {
                Some(path) => Self::from_path(&path, warnings),
                None => {
                    debug!("config: could not determine config directory");
                    Ok(None)
                }
            },
        }
    }

    /// Returns `Ok(None)` if the file does not exist.
    fn from_path(
        path: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Option<Self>, ConfigError> {
        debug!("config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("config: file does not exist at {path}");
                return Ok(None);
            }
            Err(error) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };

        let (config, unknown) =
            Self::deserialize_toml(&contents).map_err(|error| ConfigError::Parse {
                path: path.to_owned(),
                error,
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        debug!("config: loaded successfully from {path}");
        Ok(Some(config))
    }

    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedConfig = serde_ignored::deserialize(deserializer, |path| {
            unknown.insert(path.to_string());
        })?;
        Ok((config, unknown))
    }
}

/// The embedded defaults. Every setting is required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultConfig {
    log: DefaultLogConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultLogConfig {
    max_retained_lines: NonZeroUsize,
    show: LineTypeFilter,
}

impl DefaultConfig {
    const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Panics if the embedded TOML is invalid or contains unknown keys.
    fn from_embedded() -> Self {
        let deserializer = toml::Deserializer::parse(Self::DEFAULT_CONFIG)
            .expect("embedded default config should parse");
        let mut unknown = BTreeSet::new();
        let config: DefaultConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("embedded default config should be valid");

        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestConfigWarnings {
        unknown_keys: Option<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for TestConfigWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown_keys = Some((config_file.to_owned(), unknown.clone()));
        }
    }

    fn load_from_contents(
        contents: &str,
    ) -> (Result<OutputConfig, ConfigError>, TestConfigWarnings) {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, contents).unwrap();

        let mut warnings = TestConfigWarnings::default();
        let config =
            OutputConfig::load_with_warnings(ConfigLocation::Explicit(&config_path), &mut warnings);
        (config, warnings)
    }

    #[test]
    fn default_config_is_valid() {
        let config = OutputConfig::builtin();
        assert_eq!(config.max_retained_lines.get(), 5000);
        assert_eq!(config.show, LineTypeFilter::ALL);
    }

    #[test]
    fn user_config_overrides_defaults() {
        let (config, warnings) = load_from_contents(
            r#"
            [log]
            max-retained-lines = 20

            [log.show]
            plain = false
            info = false
            "#,
        );
        let config = config.expect("config valid");

        assert_eq!(config.max_retained_lines.get(), 20);
        assert!(config.show.is_enabled(LineType::Error));
        assert!(config.show.is_enabled(LineType::Success));
        assert!(!config.show.is_enabled(LineType::Info));
        assert!(!config.show.is_enabled(LineType::Plain));
        assert!(warnings.unknown_keys.is_none());
        assert_eq!(config.new_output_log().max_retained_lines().get(), 20);
    }

    #[test]
    fn ignored_keys() {
        let (config, warnings) = load_from_contents(
            r#"
            colour = "always"

            [log]
            max-retained-lines = 100
            wrap = true

            [log.show]
            fatal = true
            "#,
        );
        let config = config.expect("config valid");
        assert_eq!(config.max_retained_lines.get(), 100);

        let (_, unknown) = warnings.unknown_keys.expect("should have unknown keys");
        assert_eq!(
            unknown,
            BTreeSet::from([
                "colour".to_owned(),
                "log.show.fatal".to_owned(),
                "log.wrap".to_owned(),
            ]),
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let (config, warnings) = load_from_contents("");
        assert_eq!(config.expect("config valid"), OutputConfig::builtin());
        assert!(warnings.unknown_keys.is_none());
    }

    #[test]
    fn zero_retained_lines_is_rejected() {
        let (config, _) = load_from_contents("[log]\nmax-retained-lines = 0\n");
        assert!(
            matches!(config, Err(ConfigError::Parse { .. })),
            "expected parse error, found {config:?}"
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("does-not-exist.toml");

        let error = OutputConfig::load(ConfigLocation::Explicit(&config_path))
            .expect_err("missing explicit config should fail");
        assert!(
            matches!(&error, ConfigError::FileNotFound { path } if *path == config_path),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn isolated_uses_builtin_defaults() {
        let config = OutputConfig::load(ConfigLocation::Isolated).expect("config valid");
        assert_eq!(config, OutputConfig::builtin());
    }

    #[test]
    fn location_from_cli_or_env() {
        assert!(matches!(
            ConfigLocation::from_cli_or_env(None),
            ConfigLocation::Default
        ));
        assert!(matches!(
            ConfigLocation::from_cli_or_env(Some("none")),
            ConfigLocation::Isolated
        ));
        assert!(matches!(
            ConfigLocation::from_cli_or_env(Some("/tmp/config.toml")),
            ConfigLocation::Explicit(path) if path.as_str() == "/tmp/config.toml"
        ));
    }
}
