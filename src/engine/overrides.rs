use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::{GroupId, ItemId, ScheduleItem, Status};

/// Manual group assignments that take precedence over status matching.
///
/// When opened on a file the map is written back after every change, so an
/// assignment survives restarts.
#[derive(Debug, Default)]
pub struct OverrideStore {
    map: HashMap<ItemId, GroupId>,
    path: Option<PathBuf>,
}

impl OverrideStore {
    /// Purely in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            map,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, item: ItemId) -> Option<&GroupId> {
        self.map.get(&item)
    }

    pub fn set(&mut self, item: ItemId, group: GroupId) {
        if self.map.get(&item) == Some(&group) {
            return;
        }
        tracing::debug!(%item, %group, "override set");
        self.map.insert(item, group);
        self.flush();
    }

    pub fn clear(&mut self, item: ItemId) {
        if self.map.remove(&item).is_some() {
            tracing::debug!(%item, "override cleared");
            self.flush();
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Write the map to its file, if any.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.map)?)?;
        Ok(())
    }

    fn flush(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "failed to persist group overrides");
        }
    }
}

/// Change an item's status outside of a free-form drop (field edit, import,
/// workflow action). Status matching regains authority, so any override goes.
pub fn apply_status_edit(item: &mut ScheduleItem, status: Status, overrides: &mut OverrideStore) {
    if item.status != status {
        tracing::debug!(item = %item.id, from = %item.status, to = %status, "status edited");
        item.status = status;
    }
    overrides.clear(item.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item() -> ScheduleItem {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        ScheduleItem::new_leaf("Thumbnail", day, day)
    }

    #[test]
    fn set_get_clear() {
        let mut store = OverrideStore::new();
        let it = item();
        assert!(store.get(it.id).is_none());
        store.set(it.id, "other".into());
        assert_eq!(store.get(it.id), Some(&"other".to_string()));
        store.clear(it.id);
        assert!(store.is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("overrides.json");
        let it = item();
        {
            let mut store = OverrideStore::open(&path).unwrap();
            store.set(it.id, "other".into());
        }
        let reopened = OverrideStore::open(&path).unwrap();
        assert_eq!(reopened.get(it.id), Some(&"other".to_string()));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(OverrideStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn status_edit_clears_override() {
        let mut store = OverrideStore::new();
        let mut it = item();
        store.set(it.id, "other".into());
        apply_status_edit(&mut it, Status::Done, &mut store);
        assert_eq!(it.status, Status::Done);
        assert!(store.get(it.id).is_none());
    }
}
