//! Layered settings: built-in defaults, an optional TOML file, then
//! `CHOREBOARD__SECTION__KEY` environment variables.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use tracing::info;

use api::WebConfig;
use engine::EngineConfig;

/// File loaded when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "choreboard.toml";
const ENV_PREFIX: &str = "CHOREBOARD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub schedule: EngineConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8000".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: "sqlite://choreboard.db".into(), max_connections: 5 }
    }
}

/// Load settings. An explicit `path` must exist; the default file may not.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            File::from(path).required(true)
        }
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };
    build(Config::builder().add_source(file), None)
}

/// Finish a builder with the environment layer. `env` replaces the process
/// environment when given.
fn build(
    builder: ConfigBuilder<DefaultState>,
    env: Option<HashMap<String, String>>,
) -> Result<Settings> {
    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("failed to build config")?
        .try_deserialize::<Settings>()
        .context("failed to deserialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(raw: &str, env: &[(&str, &str)]) -> Settings {
        let env = env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        build(Config::builder().add_source(File::from_str(raw, FileFormat::Toml)), Some(env))
            .expect("settings")
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = from_toml("", &[]);
        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.database.url, "sqlite://choreboard.db");
        assert_eq!(settings.schedule.max_claims_per_day, 1);
        assert_eq!(settings.schedule.undo_window_hours, 24);
        assert_eq!(settings.web.cookie_name, "choreboard_session");
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [schedule]
            utc_offset_minutes = -300
            max_claims_per_day = 3
            "#,
            &[],
        );
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.schedule.utc_offset_minutes, -300);
        assert_eq!(settings.schedule.max_claims_per_day, 3);
        assert_eq!(settings.schedule.distribution_interval_secs, 300);
    }

    #[test]
    fn environment_overrides_file() {
        let settings = from_toml(
            "[database]\nurl = \"sqlite://file.db\"\n",
            &[
                ("CHOREBOARD__DATABASE__URL", "sqlite://env.db"),
                ("CHOREBOARD__WEB__SECURE_COOKIES", "true"),
            ],
        );
        assert_eq!(settings.database.url, "sqlite://env.db");
        assert!(settings.web.secure_cookies);
    }
}
