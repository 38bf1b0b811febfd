//! Settings management

use graft_core::access::{MemberAccessor, MemberScope};
use graft_core::registry::DEFAULT_FORMULA_TAG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {reason}")]
    Invalid { reason: String },
}

/// Runtime settings; every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub access: AccessSettings,
    pub patch: PatchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `graft_core=debug`.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Members the accessor may see, e.g. `"PUBLIC | INSTANCE"`.
    pub scope: MemberScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSettings {
    /// Activate/deactivate cycles the runtime performs.
    pub cycles: u32,
    /// Tags given to formulas the runtime adds.
    pub formula_tags: Vec<String>,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            cycles: 1,
            formula_tags: vec![DEFAULT_FORMULA_TAG.to_string()],
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Accessor honouring the configured scope.
    pub fn accessor(&self) -> MemberAccessor {
        MemberAccessor::with_scope(self.access.scope)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.patch.cycles == 0 {
            return Err(SettingsError::Invalid {
                reason: "patch.cycles must be at least 1".to_string(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(SettingsError::Invalid {
                reason: "logging.filter must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.logging.filter, "info");
        assert_eq!(settings.access.scope, MemberScope::all());
        assert_eq!(settings.patch.cycles, 1);
        assert_eq!(settings.patch.formula_tags, vec![DEFAULT_FORMULA_TAG.to_string()]);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let settings = Settings::from_json(r#"{ "patch": { "cycles": 3 } }"#).unwrap();
        assert_eq!(settings.patch.cycles, 3);
        assert_eq!(settings.patch.formula_tags, vec![DEFAULT_FORMULA_TAG.to_string()]);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn scope_uses_flag_names() {
        let settings =
            Settings::from_json(r#"{ "access": { "scope": "PUBLIC | INSTANCE" } }"#).unwrap();
        assert_eq!(settings.access.scope, MemberScope::PUBLIC | MemberScope::INSTANCE);
        assert_eq!(settings.accessor().scope(), settings.access.scope);
    }

    #[test]
    fn round_trips_through_json() {
        let mut settings = Settings::default();
        settings.logging.filter = "graft_core=debug".to_string();
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn invalid_input_is_reported() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "patch": { "cycles": 0 } }"#),
            Err(SettingsError::Invalid { .. })
        ));
    }

    #[test]
    fn load_reads_files_and_reports_missing_ones() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("graft_settings_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "logging": { "filter": "warn" } }"#).unwrap();
        let loaded = Settings::load_or_default(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.logging.filter, "warn");

        let missing = dir.join("graft_settings_missing_file.json");
        assert!(matches!(
            Settings::load(&missing),
            Err(SettingsError::Io { .. })
        ));
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
