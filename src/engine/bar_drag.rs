use chrono::{Duration, NaiveDate, Utc};

use super::session::{SessionGate, SessionOwner};
use super::store::{AuditAction, AuditEvent, AuditSink, DatePatch, ScheduleStore};
use crate::error::EngineError;
use crate::model::{ItemId, PxRect, ScaleConfig, ScheduleItem};

/// What part of the bar the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeLeft,
    ResizeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Pointer is down but has not travelled past the threshold.
    Armed,
    Dragging,
}

/// Live state of one bar drag, from pointer-down to commit or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item_id: ItemId,
    pub mode: DragMode,
    pub pointer_id: u64,
    pub phase: DragPhase,
    pub origin: PxRect,
    pub current: PxRect,
    pub origin_start: NaiveDate,
    pub origin_end: NaiveDate,
}

/// Feedback shown while dragging; nothing is persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    pub item_id: ItemId,
    pub rect: PxRect,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// A committed date change.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCommit {
    pub item_id: ItemId,
    pub from: (NaiveDate, NaiveDate),
    pub to: (NaiveDate, NaiveDate),
    pub patch: DatePatch,
    /// Set when the write failed; the change stays applied locally.
    pub notice: Option<String>,
}

/// Geometry to restore after a cancelled drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCancel {
    pub item_id: ItemId,
    pub origin: PxRect,
}

/// Pointer-driven move/resize of timeline bars, snapped to the axis grid.
#[derive(Debug)]
pub struct BarDragController {
    gate: SessionGate,
    threshold: f32,
    session: Option<DragSession>,
}

impl BarDragController {
    pub fn new(gate: SessionGate, threshold: f32) -> Self {
        Self {
            gate,
            threshold: threshold.max(0.0),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(&self.session, Some(s) if s.phase == DragPhase::Dragging)
    }

    /// Pointer went down on a bar or one of its handles.
    pub fn begin(
        &mut self,
        item: &ScheduleItem,
        mode: DragMode,
        pointer_id: u64,
        origin: PxRect,
    ) -> Result<(), EngineError> {
        self.gate.claim(SessionOwner::BarDrag, pointer_id)?;
        tracing::debug!(item = %item.id, ?mode, pointer_id, "bar drag armed");
        self.session = Some(DragSession {
            item_id: item.id,
            mode,
            pointer_id,
            phase: DragPhase::Armed,
            origin,
            current: origin,
            origin_start: item.start,
            origin_end: item.end,
        });
        Ok(())
    }

    /// Pointer moved `delta_x` pixels from where it went down. Returns the
    /// preview once the drag is live; events from other pointers are ignored.
    pub fn update(&mut self, pointer_id: u64, delta_x: f32, scale: &ScaleConfig) -> Option<DragPreview> {
        let threshold = self.threshold;
        let session = self.session.as_mut().filter(|s| s.pointer_id == pointer_id)?;
        if session.phase == DragPhase::Armed {
            if delta_x.abs() < threshold {
                return None;
            }
            session.phase = DragPhase::Dragging;
            tracing::debug!(item = %session.item_id, "bar drag started");
        }

        let cw = scale.cell_width;
        let origin = session.origin;
        match session.mode {
            DragMode::Move => {
                session.current.left = scale.snap(origin.left + delta_x);
                session.current.width = origin.width;
            }
            DragMode::ResizeLeft => {
                let left = scale.snap(origin.left + delta_x);
                let width = origin.width - (left - origin.left);
                if width > cw {
                    session.current.left = left;
                    session.current.width = width;
                }
            }
            DragMode::ResizeRight => {
                session.current.width = scale.snap(origin.width + delta_x).max(cw);
            }
        }

        let (start, end) = target_range(session, scale);
        Some(DragPreview {
            item_id: session.item_id,
            rect: session.current,
            start,
            end,
            label: range_label(start, end),
        })
    }

    /// Pointer released: write the snapped dates back. Returns `None` when
    /// nothing changed (a click, or a drag that snapped back in place).
    pub fn commit(
        &mut self,
        pointer_id: u64,
        scale: &ScaleConfig,
        items: &mut [ScheduleItem],
        store: &mut dyn ScheduleStore,
        audit: &mut dyn AuditSink,
    ) -> Option<DragCommit> {
        if self.session.as_ref()?.pointer_id != pointer_id {
            return None;
        }
        let session = self.session.take()?;
        self.gate.release(SessionOwner::BarDrag);
        if session.phase == DragPhase::Armed {
            return None;
        }

        let from = (session.origin_start, session.origin_end);
        let to = target_range(&session, scale);
        if session.current == session.origin || to == from {
            tracing::debug!(item = %session.item_id, "bar drag ended without change");
            return None;
        }
        let patch = DatePatch {
            start: (to.0 != from.0).then_some(to.0),
            end: (to.1 != from.1).then_some(to.1),
        };

        // Optimistic: the local snapshot changes whether or not the write lands.
        let name = match items.iter_mut().find(|i| i.id == session.item_id) {
            Some(item) => {
                item.set_range(to.0, to.1);
                item.name.clone()
            }
            None => session.item_id.to_string(),
        };

        let notice = match store.update_item_dates(session.item_id, patch) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(item = %session.item_id, error = %e, "failed to persist date change");
                Some(format!("Não foi possível salvar as datas de '{}': {}", name, e))
            }
        };

        let event = AuditEvent {
            entity_id: session.item_id,
            action: match session.mode {
                DragMode::Move => AuditAction::Move,
                DragMode::ResizeLeft => AuditAction::ResizeStart,
                DragMode::ResizeRight => AuditAction::ResizeEnd,
            },
            from: range_key(from.0, from.1),
            to: range_key(to.0, to.1),
            timestamp: Utc::now(),
        };
        if let Err(e) = audit.append_audit_event(event) {
            tracing::warn!(item = %session.item_id, error = %e, "failed to append audit event");
        }

        tracing::info!(
            item = %session.item_id,
            mode = ?session.mode,
            from = %range_key(from.0, from.1),
            to = %range_key(to.0, to.1),
            "bar drag committed"
        );
        Some(DragCommit {
            item_id: session.item_id,
            from,
            to,
            patch,
            notice,
        })
    }

    /// Escape or capture loss: drop the session and hand back the original
    /// geometry. Nothing is persisted.
    pub fn cancel(&mut self) -> Option<DragCancel> {
        let session = self.session.take()?;
        self.gate.release(SessionOwner::BarDrag);
        tracing::debug!(item = %session.item_id, "bar drag cancelled");
        Some(DragCancel {
            item_id: session.item_id,
            origin: session.origin,
        })
    }

    /// The pointer that owns the session lost capture.
    pub fn pointer_lost(&mut self, pointer_id: u64) -> Option<DragCancel> {
        if self.session.as_ref()?.pointer_id == pointer_id {
            self.cancel()
        } else {
            None
        }
    }
}

/// Dates the current rect stands for: the snapped pixel delta from the
/// origin, in whole cells, shifts the grabbed edge of the original range. A
/// move keeps the original duration. Reversed ranges clamp to one day.
///
/// Bars that overflow the window have a clipped origin rect, so absolute
/// pixels of the current rect cannot be read back as dates.
fn target_range(session: &DragSession, scale: &ScaleConfig) -> (NaiveDate, NaiveDate) {
    let origin = session.origin;
    let rect = session.current;
    let days_per_cell = i64::from(scale.mode.column_days());
    let shift = |px: f32| Duration::days((px / scale.cell_width).round() as i64 * days_per_cell);
    let (start, end) = match session.mode {
        DragMode::Move => {
            let by = shift(rect.left - origin.left);
            (session.origin_start + by, session.origin_end + by)
        }
        DragMode::ResizeLeft => (session.origin_start + shift(rect.left - origin.left), session.origin_end),
        DragMode::ResizeRight => (session.origin_start, session.origin_end + shift(rect.width - origin.width)),
    };
    (start, end.max(start))
}

fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} → {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"))
}

fn range_key(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}..{}", start, end)
}
