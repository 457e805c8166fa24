use std::collections::{HashMap, HashSet};

use super::overrides::OverrideStore;
use super::store::{normalize_order, OrderKind, OrderScope, OrderStore};
use crate::model::{Group, GroupId, GroupSet, ScheduleItem};

/// One rendered section of the grouped list.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub group: Group,
    pub items: Vec<&'a ScheduleItem>,
}

/// Order arrays of the grouped task list: section order, leaf order inside
/// each section, and column order. Pinned columns are kept apart and always
/// come first.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub groups: GroupSet,
    pub group_order: Vec<GroupId>,
    pub item_order: HashMap<GroupId, Vec<String>>,
    pub pinned_columns: Vec<String>,
    pub columns: Vec<String>,
    pub view: String,
    pub user: String,
}

impl BoardState {
    pub fn new(
        groups: GroupSet,
        pinned_columns: Vec<String>,
        columns: Vec<String>,
        view: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .filter(|c| !pinned_columns.contains(c))
            .collect();
        Self {
            group_order: groups.ids(),
            groups,
            item_order: HashMap::new(),
            pinned_columns,
            columns,
            view: view.into(),
            user: user.into(),
        }
    }

    /// Restore saved section and column orders. Item orders are restored
    /// lazily per group by [`load_item_orders`](Self::load_item_orders).
    pub fn restore(&mut self, orders: &dyn OrderStore) {
        if let Some(saved) = orders.load_order(&self.scope(OrderKind::Groups)) {
            self.group_order = normalize_order(&saved, &self.groups.ids());
        }
        if let Some(saved) = orders.load_order(&self.scope(OrderKind::Columns)) {
            self.columns = normalize_order(&saved, &self.columns);
        }
        self.load_item_orders(orders);
    }

    pub fn load_item_orders(&mut self, orders: &dyn OrderStore) {
        for id in self.groups.ids() {
            if let Some(saved) = orders.load_order(&self.scope(OrderKind::Items(id.clone()))) {
                self.item_order.insert(id, saved);
            }
        }
    }

    pub fn scope(&self, kind: OrderKind) -> OrderScope {
        OrderScope::new(self.view.clone(), self.user.clone(), kind)
    }

    /// Pinned columns followed by the reorderable ones.
    pub fn display_columns(&self) -> Vec<String> {
        self.pinned_columns
            .iter()
            .chain(self.columns.iter())
            .cloned()
            .collect()
    }

    pub fn is_pinned(&self, column: &str) -> bool {
        self.pinned_columns.iter().any(|c| c == column)
    }

    /// Bucket `items` into ordered sections.
    ///
    /// `items` may be a filtered view. Keys of rows that are not in `items`
    /// keep their place in the stored arrays; only visible rows that now
    /// belong elsewhere are dropped, and new visible members are appended.
    pub fn sections<'a>(
        &mut self,
        items: &'a [ScheduleItem],
        overrides: &OverrideStore,
    ) -> Vec<Section<'a>> {
        let visible: HashSet<String> = items.iter().map(|i| i.id.to_string()).collect();
        let mut buckets = self
            .groups
            .partition(items, |id| overrides.get(id).cloned());
        let mut out = Vec::with_capacity(buckets.len());
        for group_id in &self.group_order {
            let Some(pos) = buckets.iter().position(|(id, _)| id == group_id) else {
                continue;
            };
            let (_, members) = buckets.swap_remove(pos);
            let keys: Vec<String> = members.iter().map(|i| i.id.to_string()).collect();
            let saved = self.item_order.get(group_id).cloned().unwrap_or_default();
            let order = merge_visible(&saved, &keys, &visible);
            let ordered = order
                .iter()
                .filter_map(|k| members.iter().find(|i| i.id.to_string() == *k).copied())
                .collect();
            self.item_order.insert(group_id.clone(), order);
            if let Some(group) = self.groups.get(group_id) {
                out.push(Section {
                    group: group.clone(),
                    items: ordered,
                });
            }
        }
        out
    }
}

/// Stored order with duplicates removed, visible non-members dropped and
/// unseen members appended. Keys outside `visible` are left where they are.
fn merge_visible(saved: &[String], members: &[String], visible: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut order: Vec<String> = saved
        .iter()
        .filter(|k| !visible.contains(*k) || members.contains(*k))
        .filter(|k| seen.insert((*k).clone()))
        .cloned()
        .collect();
    order.extend(members.iter().filter(|k| !seen.contains(*k)).cloned());
    order
}

/// Remove `key` and re-insert it at `index` of the remaining keys. The array
/// keeps its key set: nothing is duplicated or lost.
pub fn move_key(order: &mut Vec<String>, key: &str, index: usize) {
    order.retain(|k| k != key);
    let at = index.min(order.len());
    order.insert(at, key.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::MemoryOrderStore;
    use crate::model::Status;
    use chrono::NaiveDate;

    fn board() -> BoardState {
        BoardState::new(
            GroupSet::studio_default(),
            vec!["task".into()],
            vec!["task".into(), "start".into(), "end".into(), "status".into()],
            "tasks",
            "ana",
        )
    }

    #[test]
    fn pinned_columns_are_kept_apart_and_first() {
        let b = board();
        assert_eq!(b.columns, vec!["start", "end", "status"]);
        assert_eq!(b.display_columns()[0], "task");
        assert!(b.is_pinned("task"));
    }

    #[test]
    fn move_key_keeps_key_set() {
        let mut order: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        move_key(&mut order, "a", 2);
        assert_eq!(order, vec!["b", "c", "a", "d"]);
        move_key(&mut order, "d", 99);
        assert_eq!(order, vec!["b", "c", "a", "d"]);
        move_key(&mut order, "d", 0);
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn sections_follow_saved_orders() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut a = ScheduleItem::new_leaf("A", day, day);
        let mut b = ScheduleItem::new_leaf("B", day, day);
        a.status = Status::InProgress;
        b.status = Status::InProgress;
        let items = vec![a.clone(), b.clone()];

        let mut orders = MemoryOrderStore::default();
        let mut board = board();
        orders
            .persist_order(&board.scope(OrderKind::Groups), &["done".to_string(), "doing".to_string()])
            .unwrap();
        orders
            .persist_order(
                &board.scope(OrderKind::Items("doing".into())),
                &[b.id.to_string(), a.id.to_string()],
            )
            .unwrap();
        board.restore(&orders);

        let sections = board.sections(&items, &OverrideStore::new());
        let ids: Vec<&str> = sections.iter().map(|s| s.group.id.as_str()).collect();
        assert_eq!(ids, vec!["done", "doing", "todo", "review", "other"]);
        let doing: Vec<_> = sections[1].items.iter().map(|i| i.id).collect();
        assert_eq!(doing, vec![b.id, a.id]);
    }

    #[test]
    fn filtered_render_keeps_hidden_rows_in_stored_order() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let items: Vec<ScheduleItem> = ["A", "B", "C"]
            .iter()
            .map(|name| {
                let mut item = ScheduleItem::new_leaf(*name, day, day);
                item.status = Status::InProgress;
                item
            })
            .collect();
        let keys: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();
        let saved = vec![keys[2].clone(), keys[1].clone(), keys[0].clone()];

        let mut orders = MemoryOrderStore::default();
        let mut board = board();
        orders
            .persist_order(&board.scope(OrderKind::Items("doing".into())), &saved)
            .unwrap();
        board.restore(&orders);
        let overrides = OverrideStore::new();

        let only_a = vec![items[0].clone()];
        let sections = board.sections(&only_a, &overrides);
        assert_eq!(sections[1].items.len(), 1);
        assert_eq!(board.item_order["doing"], saved);

        let sections = board.sections(&items, &overrides);
        let names: Vec<&str> = sections[1].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(board.item_order["doing"], saved);
    }

    #[test]
    fn visible_row_that_changed_group_leaves_old_order() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut a = ScheduleItem::new_leaf("A", day, day);
        let mut b = ScheduleItem::new_leaf("B", day, day);
        a.status = Status::InProgress;
        b.status = Status::InProgress;
        let mut board = board();
        let overrides = OverrideStore::new();
        board.sections(&[a.clone(), b.clone()], &overrides);
        assert_eq!(board.item_order["doing"].len(), 2);

        b.status = Status::Done;
        board.sections(&[a.clone(), b.clone()], &overrides);
        assert_eq!(board.item_order["doing"], vec![a.id.to_string()]);
        assert_eq!(board.item_order["done"], vec![b.id.to_string()]);
    }
}
