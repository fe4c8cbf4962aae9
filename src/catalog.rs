//! File-backed catalog and draft loading

use anyhow::{Context, Result};
use reconcile::{CatalogSnapshot, MemoryCatalog};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// A catalog snapshot kept in a JSON file.
///
/// All reads and writes go to the in-memory catalog; nothing touches the
/// file until `save`.
pub struct FileCatalog {
    path: PathBuf,
    catalog: MemoryCatalog,
}

impl FileCatalog {
    /// Open a snapshot file; a missing file is an empty catalog
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid catalog snapshot: {}", path.display()))?
        } else {
            log::info!("{} does not exist, starting from an empty catalog", path.display());
            CatalogSnapshot::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            catalog: MemoryCatalog::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    /// Write the current state back, replacing the file in one rename
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(&self.catalog.snapshot())
            .context("Could not serialize catalog")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).with_context(|| format!("Could not write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Could not replace {}", self.path.display()))
    }
}

/// Read a JSON array of drafts
pub fn load_drafts<D: DeserializeOwned>(path: &Path) -> Result<Vec<D>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid drafts: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{Inventories, InventoryEntryDraft, SyncOptions, Syncer};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = FileCatalog::open(&dir.path().join("catalog.json")).unwrap();
        assert_eq!(file.catalog().snapshot().resource_count(), 0);
    }

    #[test]
    fn test_sync_then_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");

        let file = FileCatalog::open(&path).unwrap();
        let stats = Syncer::new(file.catalog(), SyncOptions::<Inventories>::new())
            .sync(vec![InventoryEntryDraft::new("inv-1", "SKU-1", 4)]);
        assert_eq!(stats.created(), 1);
        file.save().unwrap();

        let reopened = FileCatalog::open(&path).unwrap();
        let entry = reopened.catalog().get::<Inventories>("inv-1").unwrap();
        assert_eq!(entry.quantity_on_stock, 4);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn test_invalid_snapshot_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileCatalog::open(&path).err().unwrap();
        assert!(err.to_string().contains("catalog.json"));
    }

    #[test]
    fn test_load_drafts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drafts.json");
        fs::write(
            &path,
            r#"[{"key": "inv-1", "sku": "SKU-1", "quantityOnStock": 3, "supplyChannelKey": "wh"}]"#,
        )
        .unwrap();

        let drafts: Vec<InventoryEntryDraft> = load_drafts(&path).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].supply_channel_key.as_deref(), Some("wh"));
    }
}
