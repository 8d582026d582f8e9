//! Settings loading: embedded defaults, an optional file, then environment.

use super::types::TlsSettings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Variable naming the settings file for [`load_settings`].
pub const CONFIG_PATH_VAR: &str = "TLSETUP_CONFIG";

/// Load [`TlsSettings`] from layered sources.
pub struct SettingsLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "TLSETUP".to_string(),
        }
    }

    /// Set the settings file. Its format follows the extension.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load settings. A configured file that does not exist is an error.
    pub fn load(&self) -> Result<TlsSettings> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = &self.config_path {
            if !path.exists() {
                bail!("settings file {} does not exist", path.display());
            }
            info!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("alpn_protocols")
                .try_parsing(true),
        );

        let settings: TlsSettings = builder
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Failed to deserialize settings")?;

        debug!(settings = ?settings, "Settings loaded");
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load settings, taking the file path from `TLSETUP_CONFIG` if set.
pub fn load_settings() -> Result<TlsSettings> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = std::env::var_os(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
        loader = loader.with_config_path(path);
    }
    loader.load()
}
