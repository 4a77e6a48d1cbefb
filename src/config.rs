//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. the path given with `--config`
//! 2. `~/.config/mailpdf/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailpdf\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The loaded [`Config`] is passed explicitly to the converters; nothing in
//! the library reads it from global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Character decoding of message bodies.
    pub decoding: DecodingConfig,
    /// Page layout of rendered text.
    pub layout: LayoutConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Also write logs to this file (no ANSI colors).
    pub log_file: Option<PathBuf>,
}

/// Character decoding of message bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Encodings tried, in order, after the header-derived hint.
    pub fallback_encodings: Vec<String>,
}

/// Page layout of rendered text. Lengths are in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Font size of body text.
    pub font_size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    /// Page margin on every side.
    pub margin: f32,
    /// Extra inset of the text frame inside the margins.
    pub padding: f32,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            fallback_encodings: ["utf-8", "windows-1252", "iso-8859-1", "utf-16", "iso-8859-15"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            leading: 12.0,
            margin: 72.0, // 1 inch
            padding: 6.0,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// The outcome of [`load_config`].
///
/// Configuration is needed to set up logging, so problems are recorded here
/// and reported with [`LoadedConfig::log`] once a subscriber is installed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// The file that was looked at, if any.
    pub path: Option<PathBuf>,
    /// Why `path` was ignored in favor of the defaults.
    pub problem: Option<ConfigProblem>,
}

/// Why a config file was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigProblem {
    NotFound,
    Unreadable(String),
    Invalid(String),
}

impl LoadedConfig {
    /// Report where the configuration came from.
    pub fn log(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match &self.problem {
            None => tracing::info!(path = %path.display(), "Loaded config"),
            Some(ConfigProblem::NotFound) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            }
            Some(ConfigProblem::Unreadable(e)) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            ),
            Some(ConfigProblem::Invalid(e)) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to parse config, using defaults"
            ),
        }
    }
}

/// Load configuration from `explicit` if given, otherwise the standard location.
///
/// Falls back to the default configuration if the file is missing or cannot
/// be parsed. A missing file at the standard location is not a problem.
pub fn load_config(explicit: Option<&Path>) -> LoadedConfig {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => config_file_path(),
    };

    let Some(path) = path else {
        return LoadedConfig {
            config: Config::default(),
            path: None,
            problem: None,
        };
    };

    if !path.exists() {
        let problem = explicit.is_some().then_some(ConfigProblem::NotFound);
        return LoadedConfig {
            config: Config::default(),
            path: problem.is_some().then_some(path),
            problem,
        };
    }

    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| ConfigProblem::Unreadable(e.to_string()))
        .and_then(|contents| {
            toml::from_str::<Config>(&contents).map_err(|e| ConfigProblem::Invalid(e.to_string()))
        });

    match parsed {
        Ok(config) => LoadedConfig {
            config,
            path: Some(path),
            problem: None,
        },
        Err(problem) => LoadedConfig {
            config: Config::default(),
            path: Some(path),
            problem: Some(problem),
        },
    }
}

/// Determine the standard config file path.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mailpdf").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.general.log_file.is_none());
        assert_eq!(
            cfg.decoding.fallback_encodings,
            vec!["utf-8", "windows-1252", "iso-8859-1", "utf-16", "iso-8859-15"]
        );
        assert_eq!(cfg.layout.font_size, 10.0);
        assert_eq!(cfg.layout.margin, 72.0);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(
            parsed.decoding.fallback_encodings,
            cfg.decoding.fallback_encodings
        );
        assert_eq!(parsed.layout, cfg.layout);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[decoding]
fallback_encodings = ["utf-8"]

[layout]
font_size = 11.0
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.decoding.fallback_encodings, vec!["utf-8"]);
        assert_eq!(cfg.layout.font_size, 11.0);
        // Other fields use defaults
        assert_eq!(cfg.layout.leading, 12.0);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").expect("write");
        let loaded = load_config(Some(&path));
        assert_eq!(loaded.config.general.log_level, "debug");
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert!(loaded.problem.is_none());
    }

    #[test]
    fn test_load_missing_or_broken_file_uses_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let missing = tmp.path().join("nope.toml");
        let loaded = load_config(Some(&missing));
        assert_eq!(loaded.config.general.log_level, "warn");
        assert_eq!(loaded.problem, Some(ConfigProblem::NotFound));

        let broken = tmp.path().join("broken.toml");
        std::fs::write(&broken, "[layout\nfont_size = ").expect("write");
        let loaded = load_config(Some(&broken));
        assert_eq!(loaded.config.layout.font_size, 10.0);
        assert!(matches!(loaded.problem, Some(ConfigProblem::Invalid(_))));
    }
}
