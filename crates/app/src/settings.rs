//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `BARS_` environment variables,
//! e.g. `BARS_APP__LEVEL=debug`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    #[serde(default = "default_cancel_threshold_hours")]
    pub default_cancel_threshold_hours: i64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            default_cancel_threshold_hours: default_cancel_threshold_hours(),
        }
    }
}

fn default_cancel_threshold_hours() -> i64 {
    ledger::DEFAULT_CANCEL_THRESHOLD_HOURS
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub ledger: Ledger,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("BARS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.ledger.default_cancel_threshold_hours, 12);
    }

    #[test]
    fn sqlite_database_and_threshold_are_read() {
        let settings = parse(
            r#"
            database = { sqlite = "bars.db" }

            [app]
            level = "debug"

            [ledger]
            default_cancel_threshold_hours = 24
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "bars.db"));
        assert_eq!(settings.ledger.default_cancel_threshold_hours, 24);
    }
}
