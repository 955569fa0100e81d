//! CLI settings. Read from `kasbuku.toml` when present, overridable through
//! `KASBUKU_*` environment variables; every key has a default so the file is
//! optional.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log filter level for the CLI and the engine (`info`, `debug`, ...).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Sqlite {
    pub path: String,
}

impl Sqlite {
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub sqlite: Sqlite,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("sqlite.path", "kasbuku.db")?
            .add_source(File::with_name("kasbuku").required(false))
            .add_source(Environment::with_prefix("KASBUKU").separator("_"))
            .build()?;

        settings.try_deserialize()
    }
}
