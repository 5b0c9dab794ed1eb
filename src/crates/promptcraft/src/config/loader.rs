//! Layered configuration loading
//!
//! Layers, later overriding earlier:
//! 1. Default values
//! 2. User-level config: ~/.promptcraft/promptcraft.toml
//! 3. Project-level config: ./.promptcraft/promptcraft.toml
//! 4. An explicit file (the CLI `--config` flag)
//!
//! Layers merge key by key, so a project file that only sets `llm.model`
//! keeps the user's `llm.api_key`.

use crate::config::schema::PromptCraftConfig;
use crate::error::{Result, WorkflowError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_DIR: &str = ".promptcraft";
const CONFIG_FILE: &str = "promptcraft.toml";

/// Finds and merges configuration files
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    user_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for the standard user and project locations.
    pub fn new() -> Self {
        Self {
            user_config_path: dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE)),
            project_config_path: std::env::current_dir()
                .ok()
                .map(|cwd| cwd.join(CONFIG_DIR).join(CONFIG_FILE)),
            explicit_path: None,
        }
    }

    /// Loader with custom user and project locations.
    pub fn with_paths(user: Option<PathBuf>, project: Option<PathBuf>) -> Self {
        Self {
            user_config_path: user,
            project_config_path: project,
            explicit_path: None,
        }
    }

    /// Add a file that must exist and overrides both standard locations.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn user_config_path(&self) -> Option<&Path> {
        self.user_config_path.as_deref()
    }

    pub fn project_config_path(&self) -> Option<&Path> {
        self.project_config_path.as_deref()
    }

    /// Merge every available layer and resolve `${VAR}` references.
    pub async fn load(&self) -> Result<PromptCraftConfig> {
        let (config, _) = self.load_with_sources().await?;
        Ok(config)
    }

    /// Like [`load`](Self::load), also returning the files that were read,
    /// lowest precedence first.
    ///
    /// Callers that set up logging from the loaded config use the list to
    /// report layers once a subscriber exists.
    pub async fn load_with_sources(&self) -> Result<(PromptCraftConfig, Vec<PathBuf>)> {
        let mut merged = toml::Table::new();
        let mut sources = Vec::new();

        for path in [&self.user_config_path, &self.project_config_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                debug!(path = %path.display(), "Config file not found, skipping");
                continue;
            }
            merge_tables(&mut merged, read_table(path).await?);
            debug!(path = %path.display(), "Loaded config layer");
            sources.push(path.clone());
        }

        if let Some(path) = &self.explicit_path {
            if !path.exists() {
                return Err(WorkflowError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            merge_tables(&mut merged, read_table(path).await?);
            debug!(path = %path.display(), "Loaded explicit config");
            sources.push(path.clone());
        }

        let mut config: PromptCraftConfig = toml::Value::Table(merged).try_into()?;
        config.resolve_env_vars();

        info!(model = %config.llm.model, layers = sources.len(), "Configuration loaded");
        Ok((config, sources))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_table(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path).await?;
    Ok(content.parse::<toml::Table>()?)
}

/// Recursively overlay `overlay` onto `base`; tables merge, scalars replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, incoming) in overlay {
        if let (Some(toml::Value::Table(existing)), toml::Value::Table(table)) =
            (base.get_mut(&key), &incoming)
        {
            merge_tables(existing, table.clone());
            continue;
        }
        base.insert(key, incoming);
    }
}
