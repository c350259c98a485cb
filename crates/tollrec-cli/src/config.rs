//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};

use tollrec_core::EngineConfig;

use crate::normalize::FleetFilter;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Booth whose crossings take the trip of the following crossing.
    pub override_booth: String,
    /// Leading digit of fleet vehicle ids.
    #[serde(deserialize_with = "code")]
    pub fleet_code_prefix: String,
    /// Name shown before fleet vehicle ids in reports.
    pub fleet_display_name: String,
    /// Trip log units containing this marker belong to the fleet.
    pub fleet_unit_marker: String,
    /// Additional trip log units that belong to the fleet.
    #[serde(deserialize_with = "codes")]
    pub extra_fleet_units: Vec<String>,
    /// First day of the reconciliation period.
    pub start_date: NaiveDate,
    /// Directory for reports written without an explicit `--output`.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            override_booth: engine.override_booth,
            fleet_code_prefix: engine.fleet_code_prefix.to_string(),
            fleet_display_name: engine.fleet_display_name,
            fleet_unit_marker: "VELOX".to_string(),
            extra_fleet_units: vec!["3502".to_string()],
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TOLLREC_*)
        figment = figment.merge(Env::prefixed("TOLLREC_"));

        figment.extract()
    }

    /// Settings handed to the correlation engine.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut chars = self.fleet_code_prefix.chars();
        let (Some(prefix), None) = (chars.next(), chars.next()) else {
            bail!(
                "fleet_code_prefix must be a single character, got {:?}",
                self.fleet_code_prefix
            );
        };
        let engine = EngineConfig {
            override_booth: self.override_booth.clone(),
            fleet_code_prefix: prefix,
            fleet_display_name: self.fleet_display_name.clone(),
        };
        engine.validate()?;
        Ok(engine)
    }

    pub fn fleet_filter(&self) -> FleetFilter {
        FleetFilter {
            marker: self.fleet_unit_marker.clone(),
            extra_units: self.extra_fleet_units.clone(),
        }
    }
}

/// A code written either quoted or as a bare number.
///
/// `TOLLREC_FLEET_CODE_PREFIX=4` reaches serde as an integer, not a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Code {
    Text(String),
    Number(u64),
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        match code {
            Code::Text(text) => text,
            Code::Number(number) => number.to_string(),
        }
    }
}

fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Code::deserialize(deserializer).map(String::from)
}

fn codes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Vec::<Code>::deserialize(deserializer).map(|codes| codes.into_iter().map(String::from).collect())
}

/// Returns the platform-specific config directory for tollrec.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tollrec"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config_matches_core_defaults() {
        let config = Config::default();

        assert_eq!(config.engine_config().unwrap(), EngineConfig::default());
        assert_eq!(
            config.start_date,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tollrec.toml");
        std::fs::write(
            &path,
            r#"
override_booth = "PEAJE NORTE"
fleet_code_prefix = "4"
extra_fleet_units = ["3502", "3510"]
start_date = "2025-03-01"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.override_booth, "PEAJE NORTE");
        assert_eq!(config.engine_config().unwrap().fleet_code_prefix, '4');
        assert_eq!(config.extra_fleet_units, vec!["3502", "3510"]);
        assert_eq!(
            config.start_date,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
        assert_eq!(config.fleet_display_name, "VELOX");
    }

    #[test]
    fn test_numeric_env_values_load_as_codes() {
        figment::Jail::expect_with(|jail| {
            let home = jail.directory().to_path_buf();
            jail.set_env("HOME", home.display());
            jail.set_env("XDG_CONFIG_HOME", home.join(".config").display());
            jail.set_env("TOLLREC_FLEET_CODE_PREFIX", "4");
            jail.set_env("TOLLREC_EXTRA_FLEET_UNITS", "[3502, 3510]");

            let config = Config::load_from(None)?;

            assert_eq!(config.fleet_code_prefix, "4");
            assert_eq!(config.extra_fleet_units, vec!["3502", "3510"]);
            assert_eq!(config.engine_config().unwrap().fleet_code_prefix, '4');
            Ok(())
        });
    }

    #[test]
    fn test_numeric_toml_values_load_as_codes() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tollrec.toml",
                "fleet_code_prefix = 2\nextra_fleet_units = [3502, \"GMT 77\"]\n",
            )?;

            let config = Config::load_from(Some(Path::new("tollrec.toml")))?;

            assert_eq!(config.fleet_code_prefix, "2");
            assert_eq!(config.extra_fleet_units, vec!["3502", "GMT 77"]);
            Ok(())
        });
    }

    #[test]
    fn test_engine_config_rejects_long_prefix() {
        let config = Config {
            fleet_code_prefix: "24".to_string(),
            ..Config::default()
        };

        assert!(config.engine_config().is_err());
    }

    #[test]
    fn test_engine_config_rejects_empty_booth() {
        let config = Config {
            override_booth: "  ".to_string(),
            ..Config::default()
        };

        let err = config.engine_config().unwrap_err();
        assert!(err.to_string().contains("override booth"), "{err}");
    }

    #[test]
    fn test_dirs_config_path_ends_with_tollrec() {
        if let Some(path) = dirs_config_path() {
            assert_eq!(path.file_name().unwrap(), "tollrec");
        }
    }
}
