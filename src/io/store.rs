//! File-backed order and audit collaborators.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::store::{AuditEvent, AuditSink, OrderScope, OrderStore};
use crate::error::StoreError;

/// All saved order arrays in one JSON object keyed by [`OrderScope::key`].
#[derive(Debug)]
pub struct JsonOrderStore {
    path: PathBuf,
    orders: BTreeMap<String, Vec<String>>,
}

impl JsonOrderStore {
    /// Load from `path`; a missing file starts empty. A corrupt file is
    /// logged and ignored so a bad write never locks the user out of the view.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let orders = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable order file");
                BTreeMap::new()
            }),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "could not read order file");
                }
                BTreeMap::new()
            }
        };
        Self { path, orders }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.orders)?)?;
        Ok(())
    }
}

impl OrderStore for JsonOrderStore {
    fn persist_order(&mut self, scope: &OrderScope, keys: &[String]) -> Result<(), StoreError> {
        self.orders.insert(scope.key(), keys.to_vec());
        self.save()
    }

    fn load_order(&self, scope: &OrderScope) -> Option<Vec<String>> {
        self.orders.get(&scope.key()).cloned()
    }
}

/// Append-only audit trail, one JSON object per line.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every event back, skipping lines that don't parse.
    pub fn read_all(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

impl AuditSink for JsonlAuditLog {
    fn append_audit_event(&mut self, event: AuditEvent) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&event)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::{AuditAction, OrderKind};
    use chrono::Utc;

    #[test]
    fn orders_survive_reopen_per_scope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("orders.json");
        let groups = OrderScope::new("tasks", "ana", OrderKind::Groups);
        let other_user = OrderScope::new("tasks", "rui", OrderKind::Groups);

        let mut store = JsonOrderStore::open(&path);
        store
            .persist_order(&groups, &["done".into(), "todo".into()])
            .unwrap();

        let reopened = JsonOrderStore::open(&path);
        assert_eq!(reopened.load_order(&groups), Some(vec!["done".into(), "todo".into()]));
        assert_eq!(reopened.load_order(&other_user), None);
    }

    #[test]
    fn corrupt_order_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(&path, "{oops").unwrap();
        let store = JsonOrderStore::open(&path);
        assert_eq!(store.load_order(&OrderScope::new("v", "u", OrderKind::Columns)), None);
    }

    #[test]
    fn audit_events_append_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = JsonlAuditLog::new(dir.path().join("audit.jsonl"));
        for action in [AuditAction::Move, AuditAction::Regroup] {
            log.append_audit_event(AuditEvent {
                entity_id: uuid::Uuid::new_v4(),
                action,
                from: "a".into(),
                to: "b".into(),
                timestamp: Utc::now(),
            })
            .unwrap();
        }
        let events = log.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].action, AuditAction::Regroup);
    }
}
