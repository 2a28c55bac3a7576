//! Configuration: TOML file + `.env` + environment overrides + defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

pub const ENV_CONFIG_PATH: &str = "SCENARIO_WIZARD_CONFIG";
pub const ENV_API_URL: &str = "SCENARIO_WIZARD_API_URL";
pub const ENV_VARIANT: &str = "SCENARIO_WIZARD_VARIANT";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Which form the wizard presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    /// Description required, per-slot comments, slots pre-filled with `default_tables`.
    #[default]
    Annotated,
    /// Only the three tables are required; slots start empty.
    Minimal,
}

impl std::str::FromStr for FormVariant {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annotated" => Ok(FormVariant::Annotated),
            "minimal" => Ok(FormVariant::Minimal),
            other => Err(AppError::Config(format!(
                "Unknown form variant \"{other}\" (expected annotated or minimal)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Base URL of the backend API, including the `/api` prefix.
    pub api_base_url: String,
    pub variant: FormVariant,
    /// Table names pre-selected in input1..input3 for the annotated form.
    pub default_tables: [String; 3],
    /// When set, logs are also written to a daily-rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            variant: FormVariant::default(),
            default_tables: Default::default(),
            log_dir: None,
        }
    }
}

impl WizardConfig {
    /// Resolve the effective configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| AppError::Config(format!("Invalid config: {e}")))
    }

    /// Apply env-style overrides. `lookup` is `std::env::var` in production.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(variant) = lookup(ENV_VARIANT).filter(|v| !v.trim().is_empty()) {
            self.variant = variant.parse()?;
        }
        Ok(())
    }

    /// Check the base URL and normalise it (no trailing slash).
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.api_base_url = validate_base_url(&self.api_base_url)?;
        Ok(self)
    }
}

fn validate_base_url(raw: &str) -> Result<String, AppError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| AppError::Config(format!("Invalid API base URL \"{raw}\": {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.as_str().trim_end_matches('/').to_string()),
        other => Err(AppError::Config(format!(
            "Unsupported URL scheme \"{other}://\". Use HTTP or HTTPS."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WizardConfig::default().validate().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.variant, FormVariant::Annotated);
        assert!(config.default_tables.iter().all(String::is_empty));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WizardConfig::from_toml_str(
            r#"
            variant = "minimal"
            default_tables = ["hist_load", "weather", "sensor"]
            "#,
        )
        .unwrap();
        assert_eq!(config.variant, FormVariant::Minimal);
        assert_eq!(config.default_tables[1], "weather");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base_url = \"https://forecast.example.com/api/\"").unwrap();
        let config = WizardConfig::from_file(file.path()).unwrap().validate().unwrap();
        assert_eq!(config.api_base_url, "https://forecast.example.com/api");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = WizardConfig::from_file(Path::new("/nonexistent/wizard.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://127.0.0.1:9000/api"),
            (ENV_VARIANT, "Minimal"),
        ]
        .into_iter()
        .collect();
        let mut config = WizardConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.variant, FormVariant::Minimal);
    }

    #[test]
    fn test_bad_variant_override() {
        let mut config = WizardConfig::default();
        let result = config.apply_overrides(|k| (k == ENV_VARIANT).then(|| "wide".to_string()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = WizardConfig {
            api_base_url: "ftp://example.com/api".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let raw = include_str!("../scenario-wizard.example.toml");
        let config = WizardConfig::from_toml_str(raw).unwrap().validate().unwrap();
        assert_eq!(config.default_tables[1], "weather_data");
        assert_eq!(config.log_dir, None);
    }
}
