//! `catsync.toml` settings

use anyhow::{Context, Result};
use reconcile::{DEFAULT_BATCH_SIZE, DEFAULT_PARALLELISM, RemovalPolicy, ResourceKind, SyncOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub parallelism: usize,
    pub ensure_channels: bool,
    pub remove_other_locales: bool,
    pub remove_other_set_entries: bool,
    pub remove_other_collection_entries: bool,
    pub remove_other_properties: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let policy = RemovalPolicy::default();
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallelism: DEFAULT_PARALLELISM,
            ensure_channels: false,
            remove_other_locales: policy.remove_other_locales,
            remove_other_set_entries: policy.remove_other_set_entries,
            remove_other_collection_entries: policy.remove_other_collection_entries,
            remove_other_properties: policy.remove_other_properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog snapshot file; `~` and env vars are expanded
    pub path: Option<String>,
}

impl Config {
    /// Load the config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Could not serialize config")?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
    }

    pub fn policy(&self) -> RemovalPolicy {
        RemovalPolicy {
            remove_other_locales: self.sync.remove_other_locales,
            remove_other_set_entries: self.sync.remove_other_set_entries,
            remove_other_collection_entries: self.sync.remove_other_collection_entries,
            remove_other_properties: self.sync.remove_other_properties,
        }
    }

    /// Engine options from the `[sync]` section
    pub fn sync_options<K: ResourceKind>(&self) -> SyncOptions<K> {
        SyncOptions::new()
            .with_batch_size(self.sync.batch_size)
            .with_parallelism(self.sync.parallelism)
            .with_ensure_channels(self.sync.ensure_channels)
            .with_policy(self.policy())
    }

    /// The catalog file: an explicit path wins over `[catalog] path`
    pub fn catalog_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        self.catalog
            .path
            .as_deref()
            .map(paths::expand)
            .context("No catalog given: pass --catalog or set [catalog] path in the config")
    }
}
