use std::cell::Cell;
use std::rc::Rc;

use crate::error::EngineError;

/// Which controller owns the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOwner {
    BarDrag,
    Reorder,
}

impl SessionOwner {
    pub fn name(self) -> &'static str {
        match self {
            SessionOwner::BarDrag => "bar drag",
            SessionOwner::Reorder => "list reorder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub owner: SessionOwner,
    pub pointer_id: u64,
}

/// Shared "one direct-manipulation session at a time" flag.
///
/// Every controller of a view holds a clone of the same gate. The gate is
/// serialized across pointers: a second finger or a second controller is
/// refused until the first session ends. Everything runs on the UI thread,
/// so `Rc<Cell<_>>` is enough.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    active: Rc<Cell<Option<ActiveSession>>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ActiveSession> {
        self.active.get()
    }

    pub fn is_busy(&self) -> bool {
        self.active.get().is_some()
    }

    pub(crate) fn claim(&self, owner: SessionOwner, pointer_id: u64) -> Result<(), EngineError> {
        if let Some(current) = self.active.get() {
            tracing::debug!(
                requested = owner.name(),
                active = current.owner.name(),
                "session claim rejected"
            );
            return Err(EngineError::ConcurrentSession {
                active: current.owner.name(),
                pointer_id: current.pointer_id,
            });
        }
        self.active.set(Some(ActiveSession { owner, pointer_id }));
        Ok(())
    }

    /// Release the gate if `owner` holds it.
    pub(crate) fn release(&self, owner: SessionOwner) {
        if matches!(self.active.get(), Some(s) if s.owner == owner) {
            self.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_rejected_until_release() {
        let gate = SessionGate::new();
        let other = gate.clone();
        gate.claim(SessionOwner::BarDrag, 1).unwrap();
        let err = other.claim(SessionOwner::Reorder, 2).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConcurrentSession { active: "bar drag", pointer_id: 1 }
        );

        // Only the owner can release.
        other.release(SessionOwner::Reorder);
        assert!(gate.is_busy());
        gate.release(SessionOwner::BarDrag);
        assert!(other.claim(SessionOwner::Reorder, 2).is_ok());
    }
}
