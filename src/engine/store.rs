//! Interfaces to the entity/storage collaborator.
//!
//! The engine never owns items: it reads a flattened snapshot through
//! [`ScheduleStore::visible_items`] and writes back only the fields it is
//! responsible for (dates, status/override, orders).

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{GroupId, ItemId, ScheduleItem, Status};

/// What the host wants to see: collapsed summaries hide their descendants.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub collapsed: HashSet<ItemId>,
    /// Case-insensitive substring on the item name; empty matches all.
    pub search: String,
    /// Restrict leaves to these statuses. Summaries are always kept.
    pub statuses: Option<BTreeSet<Status>>,
}

impl ItemFilter {
    pub fn matches(&self, item: &ScheduleItem) -> bool {
        let by_name = self.search.trim().is_empty()
            || item
                .name
                .to_lowercase()
                .contains(&self.search.trim().to_lowercase());
        let by_status = !item.is_leaf()
            || self
                .statuses
                .as_ref()
                .map_or(true, |set| set.contains(&item.status));
        by_name && by_status
    }
}

/// Date fields changed by a bar drag. `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatePatch {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverrideChange {
    #[default]
    Keep,
    Set(GroupId),
    Clear,
}

/// Group-related fields changed by a cross-group drop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupPatch {
    pub status: Option<Status>,
    pub override_group: OverrideChange,
}

/// Which order array a key list belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Groups,
    Columns,
    Items(GroupId),
}

/// Persistence key for an order array: one per view, user and array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderScope {
    pub view: String,
    pub user: String,
    pub kind: OrderKind,
}

impl OrderScope {
    pub fn new(view: impl Into<String>, user: impl Into<String>, kind: OrderKind) -> Self {
        Self {
            view: view.into(),
            user: user.into(),
            kind,
        }
    }

    pub fn key(&self) -> String {
        let kind = match &self.kind {
            OrderKind::Groups => "groups".to_string(),
            OrderKind::Columns => "columns".to_string(),
            OrderKind::Items(group) => format!("items/{}", group),
        };
        format!("{}:{}:{}", self.view, self.user, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Move,
    ResizeStart,
    ResizeEnd,
    Regroup,
}

/// One line in the item's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub entity_id: ItemId,
    pub action: AuditAction,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}

/// The entity collaborator: owns items and their lifecycle.
pub trait ScheduleStore {
    /// Hierarchy-flattened, filtered snapshot in display order.
    fn visible_items(&self, filter: &ItemFilter) -> Vec<ScheduleItem>;
    fn update_item_dates(&mut self, id: ItemId, patch: DatePatch) -> Result<(), StoreError>;
    fn update_item_group(&mut self, id: ItemId, patch: GroupPatch) -> Result<(), StoreError>;
}

/// Durable key-value persistence for order arrays.
pub trait OrderStore {
    fn persist_order(&mut self, scope: &OrderScope, keys: &[String]) -> Result<(), StoreError>;
    fn load_order(&self, scope: &OrderScope) -> Option<Vec<String>>;
}

pub trait AuditSink {
    fn append_audit_event(&mut self, event: AuditEvent) -> Result<(), StoreError>;
}

/// Order store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: HashMap<String, Vec<String>>,
}

impl OrderStore for MemoryOrderStore {
    fn persist_order(&mut self, scope: &OrderScope, keys: &[String]) -> Result<(), StoreError> {
        self.orders.insert(scope.key(), keys.to_vec());
        Ok(())
    }

    fn load_order(&self, scope: &OrderScope) -> Option<Vec<String>> {
        self.orders.get(&scope.key()).cloned()
    }
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    pub events: Vec<AuditEvent>,
}

impl AuditSink for MemoryAuditLog {
    fn append_audit_event(&mut self, event: AuditEvent) -> Result<(), StoreError> {
        self.events.push(event);
        Ok(())
    }
}

/// Reconcile a saved order with the keys that currently exist: unknown and
/// repeated keys are dropped, missing keys are appended in `current` order.
pub fn normalize_order(saved: &[String], current: &[String]) -> Vec<String> {
    let known: HashSet<&String> = current.iter().collect();
    let mut seen = HashSet::new();
    let mut out: Vec<String> = saved
        .iter()
        .filter(|k| known.contains(k) && seen.insert((*k).clone()))
        .cloned()
        .collect();
    out.extend(current.iter().filter(|k| seen.insert((*k).clone())).cloned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_drops_unknown_and_appends_missing() {
        let saved = keys(&["c", "x", "a", "c"]);
        let current = keys(&["a", "b", "c"]);
        assert_eq!(normalize_order(&saved, &current), keys(&["c", "a", "b"]));
    }

    #[test]
    fn scope_keys_are_distinct_per_user_and_array() {
        let a = OrderScope::new("tasks", "ana", OrderKind::Items("doing".into()));
        let b = OrderScope::new("tasks", "rui", OrderKind::Items("doing".into()));
        assert_eq!(a.key(), "tasks:ana:items/doing");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn filter_hides_leaves_by_status_but_keeps_summaries() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let summary = ScheduleItem::new_group("Campanha", day, day);
        let mut leaf = ScheduleItem::new_leaf("Roteiro", day, day);
        leaf.status = Status::Done;
        let filter = ItemFilter {
            statuses: Some([Status::InProgress].into_iter().collect()),
            ..Default::default()
        };
        assert!(filter.matches(&summary));
        assert!(!filter.matches(&leaf));

        let search = ItemFilter {
            search: "ROT".into(),
            ..Default::default()
        };
        assert!(search.matches(&leaf));
        assert!(!search.matches(&summary));
    }
}
