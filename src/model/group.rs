use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::item::{ItemId, ScheduleItem};
use super::status::Status;
use crate::error::EngineError;

pub type GroupId = String;

/// How a group decides which items belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRule {
    /// Items whose status is in the set.
    Predicate(BTreeSet<Status>),
    /// Only items explicitly placed here (manual override).
    FreeForm,
}

/// A section of the task list / kanban board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub label: String,
    pub order: usize,
    pub rule: GroupRule,
}

impl Group {
    pub fn predicate(
        id: impl Into<GroupId>,
        label: impl Into<String>,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            order: 0,
            rule: GroupRule::Predicate(statuses.into_iter().collect()),
        }
    }

    pub fn free_form(id: impl Into<GroupId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            order: 0,
            rule: GroupRule::FreeForm,
        }
    }

    pub fn accepts(&self, status: Status) -> bool {
        matches!(&self.rule, GroupRule::Predicate(set) if set.contains(&status))
    }

    pub fn is_free_form(&self) -> bool {
        matches!(self.rule, GroupRule::FreeForm)
    }

    /// Status written to an item dropped into this group. Keeps the current
    /// status when it already matches, otherwise the first accepted value.
    pub fn status_for(&self, current: Status) -> Option<Status> {
        match &self.rule {
            GroupRule::Predicate(set) if set.contains(&current) => Some(current),
            GroupRule::Predicate(set) => set.iter().next().copied(),
            GroupRule::FreeForm => None,
        }
    }
}

/// How an item ended up in its group. Manual assignments are always
/// resolved before predicates are consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMembership {
    Manual(GroupId),
    Predicate(GroupId),
    Fallback(GroupId),
}

impl GroupMembership {
    pub fn group_id(&self) -> &GroupId {
        match self {
            GroupMembership::Manual(id)
            | GroupMembership::Predicate(id)
            | GroupMembership::Fallback(id) => id,
        }
    }
}

/// Ordered collection of groups with a guaranteed catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSet {
    groups: Vec<Group>,
    fallback: GroupId,
}

impl GroupSet {
    /// Build the set, renumbering `order` by position. The last free-form
    /// group receives items that neither an override nor a predicate place.
    pub fn new(groups: Vec<Group>) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for group in &groups {
            if !seen.insert(group.id.clone()) {
                return Err(EngineError::DuplicateGroup(group.id.clone()));
            }
        }
        let fallback = groups
            .iter()
            .rev()
            .find(|g| g.is_free_form())
            .map(|g| g.id.clone())
            .ok_or(EngineError::NoFallbackGroup)?;
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(order, g)| Group { order, ..g })
            .collect();
        Ok(Self { groups, fallback })
    }

    /// The default dashboard sections: one per active status plus "Outros".
    pub fn studio_default() -> Self {
        let groups = vec![
            Group::predicate("todo", "Não iniciado", [Status::NotStarted]),
            Group::predicate("doing", "Em andamento", [Status::InProgress, Status::Blocked]),
            Group::predicate("review", "Em revisão", [Status::InReview]),
            Group::predicate("done", "Concluído", [Status::Done]),
            Group::free_form("other", "Outros"),
        ];
        Self {
            groups: groups
                .into_iter()
                .enumerate()
                .map(|(order, g)| Group { order, ..g })
                .collect(),
            fallback: "other".into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Group, EngineError> {
        self.get(id).ok_or_else(|| EngineError::UnknownGroup(id.to_string()))
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.id.clone()).collect()
    }

    pub fn fallback(&self) -> &GroupId {
        &self.fallback
    }

    /// Resolve an item to exactly one group: a manual override naming a known
    /// group wins, then the first predicate match in order, then the fallback.
    pub fn resolve(&self, item: &ScheduleItem, manual: Option<&GroupId>) -> GroupMembership {
        if let Some(id) = manual.filter(|id| self.get(id).is_some()) {
            return GroupMembership::Manual(id.clone());
        }
        self.groups
            .iter()
            .find(|g| g.accepts(item.status))
            .map(|g| GroupMembership::Predicate(g.id.clone()))
            .unwrap_or_else(|| GroupMembership::Fallback(self.fallback.clone()))
    }

    /// Bucket leaf items by resolved group, keeping input order inside each bucket.
    pub fn partition<'a, F>(
        &self,
        items: &'a [ScheduleItem],
        manual: F,
    ) -> Vec<(GroupId, Vec<&'a ScheduleItem>)>
    where
        F: Fn(ItemId) -> Option<GroupId>,
    {
        let mut buckets: Vec<(GroupId, Vec<&ScheduleItem>)> =
            self.groups.iter().map(|g| (g.id.clone(), Vec::new())).collect();
        for item in items.iter().filter(|i| i.is_leaf()) {
            let override_id = manual(item.id);
            let membership = self.resolve(item, override_id.as_ref());
            if let Some((_, bucket)) = buckets.iter_mut().find(|(id, _)| id == membership.group_id()) {
                bucket.push(item);
            }
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leaf(status: Status) -> ScheduleItem {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut item = ScheduleItem::new_leaf("Item", day, day);
        item.status = status;
        item
    }

    #[test]
    fn predicate_match_and_fallback() {
        let groups = GroupSet::studio_default();
        assert_eq!(
            groups.resolve(&leaf(Status::Blocked), None),
            GroupMembership::Predicate("doing".into())
        );
        assert_eq!(
            groups.resolve(&leaf(Status::Cancelled), None),
            GroupMembership::Fallback("other".into())
        );
    }

    #[test]
    fn manual_override_wins_over_predicate() {
        let groups = GroupSet::studio_default();
        let manual = "other".to_string();
        assert_eq!(
            groups.resolve(&leaf(Status::Done), Some(&manual)),
            GroupMembership::Manual("other".into())
        );
        let stale = "gone".to_string();
        assert_eq!(
            groups.resolve(&leaf(Status::Done), Some(&stale)),
            GroupMembership::Predicate("done".into())
        );
    }

    #[test]
    fn group_set_requires_free_form_fallback() {
        let only_predicates = vec![Group::predicate("done", "Concluído", [Status::Done])];
        assert_eq!(GroupSet::new(only_predicates), Err(EngineError::NoFallbackGroup));

        let dup = vec![Group::free_form("x", "X"), Group::free_form("x", "Y")];
        assert_eq!(GroupSet::new(dup), Err(EngineError::DuplicateGroup("x".into())));
        assert_eq!(
            GroupSet::studio_default().require("nope").unwrap_err(),
            EngineError::UnknownGroup("nope".into())
        );
    }

    #[test]
    fn every_leaf_lands_in_exactly_one_bucket() {
        let groups = GroupSet::studio_default();
        let items: Vec<_> = Status::ALL.iter().map(|s| leaf(*s)).collect();
        let buckets = groups.partition(&items, |_| None);
        let total: usize = buckets.iter().map(|(_, b)| b.len()).sum();
        assert_eq!(total, items.len());
    }

    #[test]
    fn status_for_keeps_matching_status() {
        let doing = Group::predicate("doing", "Em andamento", [Status::InProgress, Status::Blocked]);
        assert_eq!(doing.status_for(Status::Blocked), Some(Status::Blocked));
        assert_eq!(doing.status_for(Status::Done), Some(Status::InProgress));
        assert_eq!(Group::free_form("o", "Outros").status_for(Status::Done), None);
    }
}
