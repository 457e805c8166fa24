//! Direct-manipulation reordering for the grouped task list.
//!
//! One controller handles three classes of draggable: leaf rows (inside a
//! section or across sections), section headers, and flat columns. A press
//! arms the session; movement past the threshold activates it, shows a ghost
//! through the [`PresentationPort`] and tracks the drop target; release
//! resolves the drop against the [`BoardState`] order arrays and persists.

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use super::board::{move_key, BoardState};
use super::overrides::OverrideStore;
use super::port::{DropIndicator, PresentationPort};
use super::session::{SessionGate, SessionOwner};
use super::store::{
    AuditAction, AuditEvent, AuditSink, GroupPatch, OrderKind, OrderStore, OverrideChange,
    ScheduleStore,
};
use crate::error::{EngineError, StoreError};
use crate::model::{GroupId, GroupRule, ItemId, PxPoint, PxRect, ScheduleItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderKind {
    Item,
    Group,
    Column,
}

/// The element under the pointer at press time.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSubject {
    pub kind: ReorderKind,
    pub key: String,
    /// Section the row currently belongs to (rows only).
    pub source_group: Option<GroupId>,
    pub rect: PxRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderPhase {
    Pressed,
    Active,
}

/// Resolved insertion point. `index` counts positions among the siblings
/// with the dragged key removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub group: Option<GroupId>,
    pub insert_before: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReorderSession {
    pub subject: DragSubject,
    pub pointer_id: u64,
    pub press: PxPoint,
    pub pointer: PxPoint,
    pub phase: ReorderPhase,
    pub target: Option<DropTarget>,
}

/// A rendered slot (row, section header or column header).
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub key: String,
    pub rect: PxRect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSurface {
    pub group: GroupId,
    pub header: PxRect,
    pub body: PxRect,
    pub rows: Vec<Slot>,
}

/// Hit-test geometry of the list as last rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropSurfaces {
    pub groups: Vec<GroupSurface>,
    pub sections: Vec<Slot>,
    /// Reorderable column headers, in display order. Pinned columns are not listed.
    pub columns: Vec<Slot>,
    pub pinned_zone: Option<PxRect>,
}

/// Which parts of the view need repainting (and handles rebinding) after a
/// resolved drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSignal {
    pub items: BTreeSet<ItemId>,
    pub groups: BTreeSet<GroupId>,
    pub section_order: bool,
    pub columns: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Click, same-position drop, or release outside every surface.
    Noop,
    Resolved {
        reconcile: ReconcileSignal,
        notice: Option<String>,
    },
}

/// Collaborators a resolve writes through.
pub struct ReorderContext<'a> {
    pub board: &'a mut BoardState,
    pub items: &'a mut [ScheduleItem],
    pub overrides: &'a mut OverrideStore,
    pub store: &'a mut dyn ScheduleStore,
    pub orders: &'a mut dyn OrderStore,
    pub audit: &'a mut dyn AuditSink,
}

#[derive(Debug)]
pub struct ListReorderController {
    gate: SessionGate,
    threshold: f32,
    session: Option<ReorderSession>,
}

impl ListReorderController {
    pub fn new(gate: SessionGate, threshold: f32) -> Self {
        Self {
            gate,
            threshold: threshold.max(0.0),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&ReorderSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        matches!(&self.session, Some(s) if s.phase == ReorderPhase::Active)
    }

    /// Pointer went down on a drag handle.
    pub fn press(&mut self, subject: DragSubject, pointer_id: u64, at: PxPoint) -> Result<(), EngineError> {
        self.gate.claim(SessionOwner::Reorder, pointer_id)?;
        tracing::debug!(kind = ?subject.kind, key = %subject.key, pointer_id, "reorder pressed");
        self.session = Some(ReorderSession {
            subject,
            pointer_id,
            press: at,
            pointer: at,
            phase: ReorderPhase::Pressed,
            target: None,
        });
        Ok(())
    }

    /// Track the pointer; returns the current drop target while active.
    pub fn pointer_move(
        &mut self,
        pointer_id: u64,
        at: PxPoint,
        surfaces: &DropSurfaces,
        port: &mut dyn PresentationPort,
    ) -> Option<DropTarget> {
        let threshold = self.threshold;
        let session = self.session.as_mut().filter(|s| s.pointer_id == pointer_id)?;
        session.pointer = at;
        if session.phase == ReorderPhase::Pressed {
            if at.distance(session.press) < threshold {
                return None;
            }
            session.phase = ReorderPhase::Active;
            port.create_ghost(&session.subject.key, session.subject.rect, at);
            tracing::debug!(key = %session.subject.key, "reorder active");
        } else {
            port.move_ghost(at);
        }

        let hit = compute_drop_target(&session.subject, at, surfaces);
        port.set_indicator_position(hit.as_ref().map(|(_, indicator)| *indicator));
        session.target = hit.map(|(target, _)| target);
        session.target.clone()
    }

    /// Pointer released: resolve the last computed target.
    pub fn release(
        &mut self,
        pointer_id: u64,
        port: &mut dyn PresentationPort,
        ctx: ReorderContext<'_>,
    ) -> ReorderOutcome {
        let Some(session) = self.session.take_if(|s| s.pointer_id == pointer_id) else {
            return ReorderOutcome::Noop;
        };
        self.gate.release(SessionOwner::Reorder);
        if session.phase == ReorderPhase::Active {
            port.remove_ghost();
            port.set_indicator_position(None);
        }
        match (session.phase, session.target) {
            (ReorderPhase::Active, Some(target)) => resolve(&session.subject, &target, ctx),
            _ => ReorderOutcome::Noop,
        }
    }

    /// Escape or capture loss.
    pub fn cancel(&mut self, port: &mut dyn PresentationPort) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.gate.release(SessionOwner::Reorder);
        if session.phase == ReorderPhase::Active {
            port.remove_ghost();
            port.set_indicator_position(None);
        }
        tracing::debug!(key = %session.subject.key, "reorder cancelled");
        true
    }
}

/// Hit-test `at` against the surfaces valid for the dragged class.
pub fn compute_drop_target(
    subject: &DragSubject,
    at: PxPoint,
    surfaces: &DropSurfaces,
) -> Option<(DropTarget, DropIndicator)> {
    match subject.kind {
        ReorderKind::Item => {
            let surface = surfaces
                .groups
                .iter()
                .find(|g| g.header.contains(at) || g.body.contains(at))?;
            let rows: Vec<&Slot> = surface.rows.iter().filter(|r| r.key != subject.key).collect();
            // Over the header means the top of the body.
            let index = if surface.header.contains(at) {
                0
            } else {
                rows.iter().filter(|r| r.rect.center().y < at.y).count()
            };
            let y = line_position(&rows, index, surface.body.top, |r| r.top, |r| r.bottom());
            Some((
                DropTarget {
                    group: Some(surface.group.clone()),
                    insert_before: rows.get(index).map(|r| r.key.clone()),
                    index,
                },
                DropIndicator::Line {
                    left: surface.body.left,
                    y,
                    width: surface.body.width,
                },
            ))
        }
        ReorderKind::Group => {
            let bounds = union(surfaces.sections.iter().map(|s| s.rect))?;
            if !bounds.contains(at) {
                return None;
            }
            let siblings: Vec<&Slot> = surfaces.sections.iter().filter(|s| s.key != subject.key).collect();
            let index = siblings.iter().filter(|s| s.rect.center().y < at.y).count();
            let y = line_position(&siblings, index, bounds.top, |r| r.top, |r| r.bottom());
            Some((
                DropTarget {
                    group: None,
                    insert_before: siblings.get(index).map(|s| s.key.clone()),
                    index,
                },
                DropIndicator::Line {
                    left: bounds.left,
                    y,
                    width: bounds.width,
                },
            ))
        }
        ReorderKind::Column => {
            let siblings: Vec<&Slot> = surfaces.columns.iter().filter(|s| s.key != subject.key).collect();
            let bounds = union(surfaces.columns.iter().map(|s| s.rect).chain(surfaces.pinned_zone))?;
            let index = match surfaces.pinned_zone {
                Some(zone) if zone.contains(at) => 0,
                _ if bounds.contains(at) => siblings.iter().filter(|s| s.rect.center().x < at.x).count(),
                _ => return None,
            };
            let fallback_x = surfaces.pinned_zone.map_or(bounds.left, |z| z.right());
            let x = line_position(&siblings, index, fallback_x, |r| r.left, |r| r.right());
            Some((
                DropTarget {
                    group: None,
                    insert_before: siblings.get(index).map(|s| s.key.clone()),
                    index,
                },
                DropIndicator::Column {
                    x,
                    top: bounds.top,
                    height: bounds.height,
                },
            ))
        }
    }
}

/// Leading edge of the slot at `index`, or the trailing edge of the last
/// slot when appending.
fn line_position(
    slots: &[&Slot],
    index: usize,
    empty: f32,
    leading: impl Fn(&PxRect) -> f32,
    trailing: impl Fn(&PxRect) -> f32,
) -> f32 {
    match (slots.get(index), slots.last()) {
        (Some(slot), _) => leading(&slot.rect),
        (None, Some(last)) => trailing(&last.rect),
        (None, None) => empty,
    }
}

fn union(rects: impl Iterator<Item = PxRect>) -> Option<PxRect> {
    rects.reduce(|a, b| {
        let left = a.left.min(b.left);
        let top = a.top.min(b.top);
        PxRect::new(left, top, a.right().max(b.right()) - left, a.bottom().max(b.bottom()) - top)
    })
}

/// Apply a drop to the order arrays and the dragged item, then persist.
pub fn resolve(subject: &DragSubject, target: &DropTarget, ctx: ReorderContext<'_>) -> ReorderOutcome {
    match subject.kind {
        ReorderKind::Item => resolve_item(subject, target, ctx),
        ReorderKind::Group => {
            let kind = OrderKind::Groups;
            if !reorder(&mut ctx.board.group_order, &subject.key, target.index) {
                return ReorderOutcome::Noop;
            }
            let notice = persist(ctx.orders, ctx.board, kind, |b| &b.group_order);
            let mut reconcile = ReconcileSignal {
                section_order: true,
                ..Default::default()
            };
            reconcile.groups.insert(subject.key.clone());
            tracing::info!(group = %subject.key, index = target.index, "section reordered");
            ReorderOutcome::Resolved { reconcile, notice }
        }
        ReorderKind::Column => {
            if ctx.board.is_pinned(&subject.key) || !reorder(&mut ctx.board.columns, &subject.key, target.index) {
                return ReorderOutcome::Noop;
            }
            let notice = persist(ctx.orders, ctx.board, OrderKind::Columns, |b| &b.columns);
            tracing::info!(column = %subject.key, index = target.index, "column reordered");
            ReorderOutcome::Resolved {
                reconcile: ReconcileSignal {
                    columns: true,
                    ..Default::default()
                },
                notice,
            }
        }
    }
}

fn resolve_item(subject: &DragSubject, target: &DropTarget, ctx: ReorderContext<'_>) -> ReorderOutcome {
    let ReorderContext {
        board,
        items,
        overrides,
        store,
        orders,
        audit,
    } = ctx;
    let Ok(item_id) = Uuid::parse_str(&subject.key) else {
        tracing::warn!(key = %subject.key, "dragged row key is not an item id");
        return ReorderOutcome::Noop;
    };
    let Some(target_group) = target.group.clone() else {
        return ReorderOutcome::Noop;
    };
    let group = match board.groups.require(&target_group) {
        Ok(group) => group.clone(),
        Err(e) => {
            tracing::warn!(error = %e, "drop rejected");
            return ReorderOutcome::Noop;
        }
    };
    let source_group = subject.source_group.clone().unwrap_or_else(|| target_group.clone());

    let mut reconcile = ReconcileSignal::default();
    let mut notices = Vec::new();

    if source_group == target_group {
        let order = board.item_order.entry(target_group.clone()).or_default();
        let index = stored_index(order, &subject.key, target);
        if !reorder(order, &subject.key, index) {
            return ReorderOutcome::Noop;
        }
    } else {
        board
            .item_order
            .entry(source_group.clone())
            .or_default()
            .retain(|k| k != &subject.key);
        let order = board.item_order.entry(target_group.clone()).or_default();
        let index = stored_index(order, &subject.key, target);
        move_key(order, &subject.key, index);

        let item = items.iter_mut().find(|i| i.id == item_id);
        let patch = match &group.rule {
            GroupRule::Predicate(_) => {
                let current = item.as_ref().map(|i| i.status).unwrap_or_default();
                let status = group.status_for(current).unwrap_or(current);
                if let Some(item) = item {
                    item.status = status;
                }
                overrides.clear(item_id);
                GroupPatch {
                    status: Some(status),
                    override_group: OverrideChange::Clear,
                }
            }
            GroupRule::FreeForm => {
                overrides.set(item_id, target_group.clone());
                GroupPatch {
                    status: None,
                    override_group: OverrideChange::Set(target_group.clone()),
                }
            }
        };
        if let Err(e) = store.update_item_group(item_id, patch) {
            notices.push(write_failed(item_id, &e));
        }

        let event = AuditEvent {
            entity_id: item_id,
            action: AuditAction::Regroup,
            from: source_group.clone(),
            to: target_group.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = audit.append_audit_event(event) {
            tracing::warn!(item = %item_id, error = %e, "failed to append audit event");
        }

        notices.extend(persist(orders, board, OrderKind::Items(source_group.clone()), |b| {
            &b.item_order[&source_group]
        }));
        reconcile.groups.insert(source_group.clone());
    }

    notices.extend(persist(orders, board, OrderKind::Items(target_group.clone()), |b| {
        &b.item_order[&target_group]
    }));
    reconcile.groups.insert(target_group.clone());
    reconcile.items.insert(item_id);
    tracing::info!(item = %item_id, from = %source_group, to = %target_group, index = target.index, "row moved");

    ReorderOutcome::Resolved {
        reconcile,
        notice: notices.into_iter().next(),
    }
}

/// Position in the stored row order (without `key`) for a drop computed on
/// the rendered rows. The stored order may hold rows the current filter
/// hides, so the drop is anchored on `insert_before` rather than the index.
fn stored_index(order: &[String], key: &str, target: &DropTarget) -> usize {
    let mut rest = order.iter().filter(|k| k.as_str() != key);
    match &target.insert_before {
        Some(before) => rest.position(|k| k == before).unwrap_or(target.index),
        None => rest.count(),
    }
}

/// Filter-then-splice. Returns false when the key would land where it is.
fn reorder(order: &mut Vec<String>, key: &str, index: usize) -> bool {
    let Some(current) = order.iter().position(|k| k == key) else {
        return false;
    };
    if current == index.min(order.len() - 1) {
        return false;
    }
    move_key(order, key, index);
    true
}

fn persist<F>(orders: &mut dyn OrderStore, board: &BoardState, kind: OrderKind, keys: F) -> Option<String>
where
    F: Fn(&BoardState) -> &Vec<String>,
{
    let scope = board.scope(kind);
    match orders.persist_order(&scope, keys(board)) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(scope = %scope.key(), error = %e, "failed to persist order");
            Some(format!("Não foi possível salvar a ordem: {}", e))
        }
    }
}

fn write_failed(item: ItemId, e: &StoreError) -> String {
    tracing::warn!(%item, error = %e, "failed to persist group change");
    format!("Não foi possível mover o item: {}", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::port::NullPort;
    use crate::engine::store::{DatePatch, ItemFilter, MemoryAuditLog, MemoryOrderStore};
    use crate::model::{GroupSet, Status};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingStore {
        groups: Vec<(ItemId, GroupPatch)>,
    }

    impl ScheduleStore for RecordingStore {
        fn visible_items(&self, _filter: &ItemFilter) -> Vec<ScheduleItem> {
            Vec::new()
        }

        fn update_item_dates(&mut self, _id: ItemId, _patch: DatePatch) -> Result<(), StoreError> {
            Ok(())
        }

        fn update_item_group(&mut self, id: ItemId, patch: GroupPatch) -> Result<(), StoreError> {
            self.groups.push((id, patch));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPort {
        ghost: Option<String>,
        indicator: Option<DropIndicator>,
    }

    impl PresentationPort for RecordingPort {
        fn create_ghost(&mut self, key: &str, _source: PxRect, _at: PxPoint) {
            self.ghost = Some(key.to_string());
        }
        fn move_ghost(&mut self, _at: PxPoint) {}
        fn remove_ghost(&mut self) {
            self.ghost = None;
        }
        fn set_indicator_position(&mut self, indicator: Option<DropIndicator>) {
            self.indicator = indicator;
        }
    }

    struct Fixture {
        board: BoardState,
        items: Vec<ScheduleItem>,
        overrides: OverrideStore,
        store: RecordingStore,
        orders: MemoryOrderStore,
        audit: MemoryAuditLog,
    }

    impl Fixture {
        fn new() -> Self {
            let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
            let mut items = Vec::new();
            for (name, status) in [("Roteiro", Status::InProgress), ("Trilha", Status::InProgress), ("Capa", Status::Done)] {
                let mut item = ScheduleItem::new_leaf(name, day, day);
                item.status = status;
                items.push(item);
            }
            let mut board = BoardState::new(
                GroupSet::studio_default(),
                vec!["task".into()],
                vec!["task".into(), "start".into(), "end".into(), "status".into()],
                "tasks",
                "ana",
            );
            let overrides = OverrideStore::new();
            board.sections(&items, &overrides);
            Self {
                board,
                items,
                overrides,
                store: RecordingStore::default(),
                orders: MemoryOrderStore::default(),
                audit: MemoryAuditLog::default(),
            }
        }

        fn ctx(&mut self) -> ReorderContext<'_> {
            ReorderContext {
                board: &mut self.board,
                items: &mut self.items,
                overrides: &mut self.overrides,
                store: &mut self.store,
                orders: &mut self.orders,
                audit: &mut self.audit,
            }
        }

        fn row(&self, idx: usize, group: &str) -> DragSubject {
            DragSubject {
                kind: ReorderKind::Item,
                key: self.items[idx].id.to_string(),
                source_group: Some(group.into()),
                rect: PxRect::new(0.0, 0.0, 200.0, 24.0),
            }
        }

        /// Section `i` has a 20px header at 100*i and a body below it; rows are 24px.
        fn surfaces(&mut self) -> DropSurfaces {
            let overrides = OverrideStore::new();
            let items = self.items.clone();
            let sections = self.board.sections(&items, &overrides);
            let mut out = DropSurfaces::default();
            for (i, section) in sections.iter().enumerate() {
                let top = i as f32 * 100.0;
                let header = PxRect::new(0.0, top, 200.0, 20.0);
                out.sections.push(Slot {
                    key: section.group.id.clone(),
                    rect: PxRect::new(0.0, top, 200.0, 100.0),
                });
                out.groups.push(GroupSurface {
                    group: section.group.id.clone(),
                    header,
                    body: PxRect::new(0.0, top + 20.0, 200.0, 80.0),
                    rows: section
                        .items
                        .iter()
                        .enumerate()
                        .map(|(r, item)| Slot {
                            key: item.id.to_string(),
                            rect: PxRect::new(0.0, top + 20.0 + r as f32 * 24.0, 200.0, 24.0),
                        })
                        .collect(),
                });
            }
            out
        }
    }

    fn drag(
        fx: &mut Fixture,
        subject: DragSubject,
        to: PxPoint,
        port: &mut dyn PresentationPort,
    ) -> ReorderOutcome {
        let surfaces = fx.surfaces();
        let mut ctl = ListReorderController::new(SessionGate::new(), 5.0);
        let start = subject.rect.center();
        ctl.press(subject, 1, start).unwrap();
        ctl.pointer_move(1, to, &surfaces, port);
        ctl.release(1, port, fx.ctx())
    }

    #[test]
    fn move_to_predicate_group_sets_status_and_clears_override() {
        let mut fx = Fixture::new();
        let id = fx.items[0].id;
        fx.overrides.set(id, "other".into());
        // "done" is the fourth section; drop on its header.
        let subject = fx.row(0, "doing");
        let outcome = drag(&mut fx, subject, PxPoint::new(50.0, 305.0), &mut NullPort);

        assert!(matches!(outcome, ReorderOutcome::Resolved { .. }));
        assert_eq!(fx.items[0].status, Status::Done);
        assert!(fx.overrides.get(id).is_none());
        assert_eq!(
            fx.store.groups,
            vec![(id, GroupPatch { status: Some(Status::Done), override_group: OverrideChange::Clear })]
        );
        assert_eq!(fx.board.item_order["done"][0], id.to_string());
        assert_eq!(fx.audit.events[0].to, "done");
    }

    #[test]
    fn move_to_free_form_group_records_override_only() {
        let mut fx = Fixture::new();
        let id = fx.items[0].id;
        let subject = fx.row(0, "doing");
        let outcome = drag(&mut fx, subject, PxPoint::new(50.0, 430.0), &mut NullPort);

        let ReorderOutcome::Resolved { reconcile, notice } = outcome else {
            panic!("expected a resolved drop");
        };
        assert!(notice.is_none());
        assert_eq!(fx.items[0].status, Status::InProgress);
        assert_eq!(fx.overrides.get(id), Some(&"other".to_string()));
        assert!(reconcile.groups.contains("doing") && reconcile.groups.contains("other"));
        assert!(reconcile.items.contains(&id));

        let sections = fx.board.sections(&fx.items, &fx.overrides);
        let other = sections.iter().find(|s| s.group.id == "other").unwrap();
        assert_eq!(other.items[0].id, id);
    }

    #[test]
    fn reorder_within_group_persists_item_order() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.items[0].id.to_string(), fx.items[1].id.to_string());
        let mut subject = fx.row(0, "doing");
        subject.rect = PxRect::new(0.0, 120.0, 200.0, 24.0);
        // Below the second row's midpoint (y = 156).
        drag(&mut fx, subject, PxPoint::new(50.0, 160.0), &mut NullPort);

        assert_eq!(fx.board.item_order["doing"], vec![b.clone(), a.clone()]);
        let scope = fx.board.scope(OrderKind::Items("doing".into()));
        assert_eq!(fx.orders.load_order(&scope), Some(vec![b, a]));
        assert!(fx.store.groups.is_empty());
    }

    #[test]
    fn drop_on_filtered_rows_keeps_hidden_row_in_place() {
        let mut fx = Fixture::new();
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut hidden = ScheduleItem::new_leaf("Oculto", day, day);
        hidden.status = Status::InProgress;
        let (r, t, h) = (fx.items[0].id.to_string(), fx.items[1].id.to_string(), hidden.id.to_string());
        // The hidden row sits between the two visible ones but is not rendered.
        fx.board.item_order.insert("doing".into(), vec![r.clone(), h.clone(), t.clone()]);

        let mut subject = fx.row(0, "doing");
        subject.rect = PxRect::new(0.0, 120.0, 200.0, 24.0);
        // Below the last visible row: append after it.
        let outcome = drag(&mut fx, subject, PxPoint::new(50.0, 175.0), &mut NullPort);

        assert!(matches!(outcome, ReorderOutcome::Resolved { .. }));
        assert_eq!(fx.board.item_order["doing"], vec![h.clone(), t.clone(), r.clone()]);
        let scope = fx.board.scope(OrderKind::Items("doing".into()));
        assert_eq!(fx.orders.load_order(&scope), Some(vec![h, t, r]));
    }

    #[test]
    fn drop_outside_every_surface_is_noop() {
        let mut fx = Fixture::new();
        let before = fx.items.clone();
        let mut port = RecordingPort::default();
        let subject = fx.row(0, "doing");
        let outcome = drag(&mut fx, subject, PxPoint::new(900.0, 900.0), &mut port);
        assert_eq!(outcome, ReorderOutcome::Noop);
        assert_eq!(fx.items, before);
        assert!(port.ghost.is_none());
        assert!(port.indicator.is_none());
        assert!(fx.store.groups.is_empty());
    }

    #[test]
    fn small_movement_never_activates() {
        let mut fx = Fixture::new();
        let surfaces = fx.surfaces();
        let mut port = RecordingPort::default();
        let mut ctl = ListReorderController::new(SessionGate::new(), 5.0);
        let subject = fx.row(0, "doing");
        ctl.press(subject, 1, PxPoint::new(10.0, 130.0)).unwrap();
        assert!(ctl.pointer_move(1, PxPoint::new(13.0, 133.0), &surfaces, &mut port).is_none());
        assert!(port.ghost.is_none());
        assert_eq!(ctl.release(1, &mut port, fx.ctx()), ReorderOutcome::Noop);
    }

    #[test]
    fn ghost_and_indicator_follow_active_drag() {
        let mut fx = Fixture::new();
        let surfaces = fx.surfaces();
        let mut port = RecordingPort::default();
        let gate = SessionGate::new();
        let mut ctl = ListReorderController::new(gate.clone(), 5.0);
        let subject = fx.row(2, "done");
        let key = subject.key.clone();
        ctl.press(subject, 1, PxPoint::new(10.0, 330.0)).unwrap();
        let target = ctl.pointer_move(1, PxPoint::new(10.0, 10.0), &surfaces, &mut port).unwrap();
        assert_eq!(target.group.as_deref(), Some("todo"));
        assert_eq!(target.index, 0);
        assert_eq!(port.ghost, Some(key));
        assert_eq!(port.indicator, Some(DropIndicator::Line { left: 0.0, y: 20.0, width: 200.0 }));

        assert!(ctl.cancel(&mut port));
        assert!(port.ghost.is_none());
        assert!(!gate.is_busy());
    }

    #[test]
    fn section_reorder_moves_group_key() {
        let mut fx = Fixture::new();
        let subject = DragSubject {
            kind: ReorderKind::Group,
            key: "other".into(),
            source_group: None,
            rect: PxRect::new(0.0, 400.0, 200.0, 100.0),
        };
        drag(&mut fx, subject, PxPoint::new(50.0, 10.0), &mut NullPort);
        assert_eq!(fx.board.group_order, vec!["other", "todo", "doing", "review", "done"]);
    }

    fn column_surfaces(board: &BoardState) -> DropSurfaces {
        DropSurfaces {
            columns: board
                .columns
                .iter()
                .enumerate()
                .map(|(i, key)| Slot {
                    key: key.clone(),
                    rect: PxRect::new(100.0 + i as f32 * 60.0, 0.0, 60.0, 20.0),
                })
                .collect(),
            pinned_zone: Some(PxRect::new(0.0, 0.0, 100.0, 20.0)),
            ..Default::default()
        }
    }

    fn column_subject(key: &str) -> DragSubject {
        DragSubject {
            kind: ReorderKind::Column,
            key: key.into(),
            source_group: None,
            rect: PxRect::new(0.0, 0.0, 60.0, 20.0),
        }
    }

    #[test]
    fn pinned_zone_drop_moves_column_to_front() {
        let board = Fixture::new().board;
        let surfaces = column_surfaces(&board);
        let (target, indicator) =
            compute_drop_target(&column_subject("status"), PxPoint::new(20.0, 10.0), &surfaces).unwrap();
        assert_eq!(target.index, 0);
        assert_eq!(target.insert_before.as_deref(), Some("start"));
        assert_eq!(indicator, DropIndicator::Column { x: 100.0, top: 0.0, height: 20.0 });

        let mut fx = Fixture::new();
        let outcome = resolve(&column_subject("status"), &target, fx.ctx());
        assert!(matches!(outcome, ReorderOutcome::Resolved { reconcile, .. } if reconcile.columns));
        assert_eq!(fx.board.display_columns(), vec!["task", "status", "start", "end"]);
    }

    #[test]
    fn second_press_is_rejected_while_session_active() {
        let gate = SessionGate::new();
        let mut a = ListReorderController::new(gate.clone(), 5.0);
        let mut b = ListReorderController::new(gate, 5.0);
        a.press(column_subject("start"), 1, PxPoint::default()).unwrap();
        assert!(b.press(column_subject("end"), 2, PxPoint::default()).is_err());
        assert_eq!(a.session().unwrap().subject.key, "start");
    }

    proptest! {
        #[test]
        fn column_order_stays_a_permutation(moves in prop::collection::vec((0usize..3, 0usize..4), 1..40)) {
            let mut fx = Fixture::new();
            let original: BTreeSet<String> = fx.board.columns.iter().cloned().collect();
            for (pick, index) in moves {
                let key = fx.board.columns[pick].clone();
                let target = DropTarget { group: None, insert_before: None, index };
                resolve(&column_subject(&key), &target, fx.ctx());
                let now: BTreeSet<String> = fx.board.columns.iter().cloned().collect();
                prop_assert_eq!(fx.board.columns.len(), original.len());
                prop_assert_eq!(&now, &original);
            }
        }
    }
}
