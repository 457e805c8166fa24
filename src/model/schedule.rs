use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::item::{ItemId, ScheduleItem, ITEM_PALETTE};
use super::status::Status;
use crate::engine::store::{DatePatch, GroupPatch, ItemFilter, OverrideChange, ScheduleStore};
use crate::error::StoreError;

/// A studio schedule: projects, phases and deliverables in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    pub items: Vec<ScheduleItem>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            name: "Cronograma sem título".to_string(),
            items: Vec::new(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Schedule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A small studio campaign around `today`, used on first launch.
    pub fn sample(today: NaiveDate) -> Self {
        let day = |offset: i64| today + Duration::days(offset);
        let mut schedule = Schedule::new("Campanha de lançamento");

        // ── Phase 1: Pré-produção ──
        let pre = ScheduleItem::new_group("Pré-produção", day(-6), day(6));
        let mut briefing = ScheduleItem::new_leaf("Briefing com cliente", day(-6), day(-4));
        briefing.status = Status::Done;
        let mut script = ScheduleItem::new_leaf("Roteiro", day(-3), day(2));
        script.status = Status::InReview;
        script.depends_on.insert(briefing.id);
        let mut storyboard = ScheduleItem::new_leaf("Storyboard", day(1), day(6));
        storyboard.status = Status::InProgress;
        storyboard.progress_percent = Some(30);
        storyboard.depends_on.insert(script.id);

        // ── Phase 2: Produção ──
        let production = ScheduleItem::new_group("Produção", day(7), day(24));
        let mut shoot = ScheduleItem::new_leaf("Gravação", day(7), day(11));
        shoot.depends_on.insert(storyboard.id);
        let mut edit = ScheduleItem::new_leaf("Edição", day(12), day(20));
        edit.depends_on.insert(shoot.id);
        let mut color = ScheduleItem::new_leaf("Correção de cor", day(18), day(22));
        color.status = Status::Blocked;
        color.depends_on.insert(edit.id);
        let mut thumbs = ScheduleItem::new_leaf("Thumbnails", day(21), day(24));
        thumbs.depends_on.insert(edit.id);

        let mut children = [briefing, script, storyboard, shoot, edit, color, thumbs];
        for (i, item) in children.iter_mut().enumerate() {
            item.color = ITEM_PALETTE[i % ITEM_PALETTE.len()];
            item.parent_id = Some(if i < 3 { pre.id } else { production.id });
        }
        let [a, b, c, d, e, f, g] = children;
        schedule.items = vec![pre, a, b, c, production, d, e, f, g];
        schedule
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn get(&self, id: ItemId) -> Option<&ScheduleItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut ScheduleItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Depth-first flattening: each item is followed by its children, roots
    /// keep stored order, collapsed items hide their descendants. Items whose
    /// parent is missing are treated as roots, and so is the first item of a
    /// parent cycle that no root reaches.
    fn flatten(&self, filter: &ItemFilter) -> Vec<(usize, &ScheduleItem)> {
        let ids: HashSet<ItemId> = self.items.iter().map(|i| i.id).collect();
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut reached = HashSet::new();
        let roots = self
            .items
            .iter()
            .filter(|i| i.parent_id.map_or(true, |p| !ids.contains(&p) || p == i.id));
        for root in roots {
            self.mark_subtree(root.id, &mut reached);
            self.visit(root, 0, filter, &mut visited, &mut out);
        }
        for item in &self.items {
            if reached.contains(&item.id) {
                continue;
            }
            tracing::warn!(item = %item.id, name = %item.name, "parent cycle, showing item as a root");
            self.mark_subtree(item.id, &mut reached);
            self.visit(item, 0, filter, &mut visited, &mut out);
        }
        out
    }

    /// Every item below `id`, ignoring collapse.
    fn mark_subtree(&self, id: ItemId, reached: &mut HashSet<ItemId>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if reached.insert(id) {
                stack.extend(self.items.iter().filter(|c| c.parent_id == Some(id)).map(|c| c.id));
            }
        }
    }

    fn visit<'a>(
        &'a self,
        item: &'a ScheduleItem,
        depth: usize,
        filter: &ItemFilter,
        visited: &mut HashSet<ItemId>,
        out: &mut Vec<(usize, &'a ScheduleItem)>,
    ) {
        if !visited.insert(item.id) {
            return;
        }
        if filter.matches(item) {
            out.push((depth, item));
        }
        if filter.collapsed.contains(&item.id) {
            return;
        }
        for child in self.items.iter().filter(|c| c.parent_id == Some(item.id) && c.id != item.id) {
            self.visit(child, depth + 1, filter, visited, out);
        }
    }

    /// Visible rows with their nesting depth, for indentation.
    pub fn visible_rows(&self, filter: &ItemFilter) -> Vec<(usize, ItemId)> {
        self.flatten(filter).into_iter().map(|(d, i)| (d, i.id)).collect()
    }
}

impl ScheduleStore for Schedule {
    fn visible_items(&self, filter: &ItemFilter) -> Vec<ScheduleItem> {
        self.flatten(filter).into_iter().map(|(_, i)| i.clone()).collect()
    }

    fn update_item_dates(&mut self, id: ItemId, patch: DatePatch) -> Result<(), StoreError> {
        let item = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        let start = patch.start.unwrap_or(item.start);
        let end = patch.end.unwrap_or(item.end);
        item.set_range(start, end);
        self.touch();
        Ok(())
    }

    fn update_item_group(&mut self, id: ItemId, patch: GroupPatch) -> Result<(), StoreError> {
        let item = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let OverrideChange::Set(group) = &patch.override_group {
            tracing::debug!(item = %id, %group, "manual group recorded");
        }
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn sample() -> (Schedule, ItemId, ItemId, ItemId) {
        let mut schedule = Schedule::new("Teste");
        let project = ScheduleItem::new_group("Campanha", d(1), d(20));
        let mut a = ScheduleItem::new_leaf("Roteiro", d(2), d(4));
        let mut b = ScheduleItem::new_leaf("Gravação", d(5), d(9));
        a.parent_id = Some(project.id);
        b.parent_id = Some(project.id);
        let ids = (project.id, a.id, b.id);
        // Children stored before their parent still flatten after it.
        schedule.items = vec![a, project, b];
        (schedule, ids.0, ids.1, ids.2)
    }

    #[test]
    fn flattens_parent_before_children() {
        let (schedule, project, a, b) = sample();
        let rows = schedule.visible_rows(&ItemFilter::default());
        assert_eq!(rows, vec![(0, project), (1, a), (1, b)]);
    }

    #[test]
    fn collapsed_parent_hides_children() {
        let (schedule, project, _, _) = sample();
        let filter = ItemFilter {
            collapsed: [project].into_iter().collect(),
            ..Default::default()
        };
        let visible = schedule.visible_items(&filter);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, project);
    }

    fn cycle() -> (Schedule, ItemId, ItemId) {
        let mut schedule = Schedule::new("Ciclo");
        let mut a = ScheduleItem::new_group("A", d(1), d(5));
        let mut b = ScheduleItem::new_group("B", d(2), d(6));
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let ids = (a.id, b.id);
        schedule.items = vec![a, b];
        (schedule, ids.0, ids.1)
    }

    #[test]
    fn parent_cycle_still_shows_every_item() {
        let (schedule, a, b) = cycle();
        let rows = schedule.visible_rows(&ItemFilter::default());
        assert_eq!(rows, vec![(0, a), (1, b)]);
    }

    #[test]
    fn collapsed_cycle_entry_hides_the_rest() {
        let (schedule, a, _) = cycle();
        let filter = ItemFilter {
            collapsed: [a].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(schedule.visible_rows(&filter), vec![(0, a)]);
    }

    #[test]
    fn date_patch_touches_only_given_fields() {
        let (mut schedule, _, a, _) = sample();
        schedule
            .update_item_dates(a, DatePatch { start: None, end: Some(d(6)) })
            .unwrap();
        let item = schedule.get(a).unwrap();
        assert_eq!((item.start, item.end), (d(2), d(6)));
        assert!(matches!(
            schedule.update_item_dates(uuid::Uuid::new_v4(), DatePatch::default()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn sample_links_resolve_and_nest() {
        let schedule = Schedule::sample(d(10));
        let rows = schedule.visible_rows(&ItemFilter::default());
        assert_eq!(rows.len(), schedule.items.len());
        for item in &schedule.items {
            for dep in &item.depends_on {
                assert!(schedule.get(*dep).is_some());
            }
        }
        assert!(rows.iter().filter(|(depth, _)| *depth == 0).count() == 2);
    }

    #[test]
    fn group_patch_sets_status() {
        let (mut schedule, _, a, _) = sample();
        schedule
            .update_item_group(a, GroupPatch { status: Some(Status::Done), override_group: OverrideChange::Clear })
            .unwrap();
        assert_eq!(schedule.get(a).unwrap().status, Status::Done);
    }
}
