//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/ringdesk/config.toml)
//! 3. Project config (.ringdesk/config.toml)
//! 4. Environment variables (RINGDESK_* prefix, `__` for nesting)
//! 5. Legacy backend variables (PYTHON_SERVER_URL, PY_SERVER_URL)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DeskError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let figment = Self::figment(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
        );
        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    /// Build the layered figment without extracting it
    pub fn figment(global: Option<&Path>, project: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // RINGDESK_UPSTREAM__API_BASE -> upstream.api_base
        figment = figment.merge(Env::prefixed("RINGDESK_").split("__").lowercase(true));

        // Variables the web deployment already sets
        figment
            .merge(
                Env::raw()
                    .only(&["PYTHON_SERVER_URL"])
                    .map(|_| "upstream.api_base".into()),
            )
            .merge(
                Env::raw()
                    .only(&["PY_SERVER_URL"])
                    .map(|_| "upstream.context_base".into()),
            )
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| DeskError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/ringdesk/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("ringdesk"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".ringdesk")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| DeskError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DeskError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    /// Initialize project configuration under `dir`
    pub fn init_project_in(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let config_path = dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, Self::default_config_toml())?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    /// Generate default config content (TOML)
    fn default_config_toml() -> String {
        r#"# ringdesk configuration
# Project settings in .ringdesk/config.toml override ~/.config/ringdesk/config.toml.

version = "1.0"

[gateway]
bind = "127.0.0.1:3000"

[upstream]
api_base = "http://localhost:8000"
context_base = "http://localhost:8001"
timeout_secs = 30

[chat]
gateway_url = "http://127.0.0.1:3000"
poll_interval_ms = 1000
max_poll_attempts = 30
history_refresh_ms = 2000
poll_after_failed_submit = true

[storage]
cache_path = ".ringdesk/cache.db"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::extract(ConfigLoader::figment(None, &temp_dir.path().join("none.toml")))
                .unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.chat.max_poll_attempts, 30);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");
        fs::write(
            &global,
            "[upstream]\napi_base = \"http://global:8000\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        fs::write(&project, "[upstream]\napi_base = \"http://project:8000\"\n").unwrap();

        let config =
            ConfigLoader::extract(ConfigLoader::figment(Some(&global), &project)).unwrap();
        assert_eq!(config.upstream.api_base, "http://project:8000");
        assert_eq!(config.upstream.timeout_secs, 5);
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_project_in(&temp_dir.path().join(".ringdesk"), false)
            .unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.gateway.bind, "127.0.0.1:3000");
        assert_eq!(config.upstream.context_base, "http://localhost:8001");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[chat]\nmax_poll_attempts = 0\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(DeskError::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let temp_dir = TempDir::new().unwrap();
        // SAFETY: This test runs in isolation
        unsafe {
            std::env::set_var("RINGDESK_CHAT__POLL_INTERVAL_MS", "250");
        }
        let config =
            ConfigLoader::extract(ConfigLoader::figment(None, &temp_dir.path().join("x.toml")))
                .unwrap();
        unsafe {
            std::env::remove_var("RINGDESK_CHAT__POLL_INTERVAL_MS");
        }
        assert_eq!(config.chat.poll_interval_ms, 250);
    }
}
