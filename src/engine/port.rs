use crate::model::{PxPoint, PxRect};

/// Where the drop indicator should be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropIndicator {
    /// Horizontal line across a list at `y`, spanning `left..left+width`.
    Line { left: f32, y: f32, width: f32 },
    /// Vertical bar between two columns at `x`.
    Column { x: f32, top: f32, height: f32 },
}

/// Rendering hooks the reorder engine drives during an active drag.
/// Implemented once per UI stack.
pub trait PresentationPort {
    /// Show a lightweight proxy of the dragged element.
    fn create_ghost(&mut self, key: &str, source: PxRect, at: PxPoint);
    fn move_ghost(&mut self, at: PxPoint);
    fn remove_ghost(&mut self);
    /// `None` hides the indicator.
    fn set_indicator_position(&mut self, indicator: Option<DropIndicator>);
}

/// Port that draws nothing, for headless callers.
#[derive(Debug, Default)]
pub struct NullPort;

impl PresentationPort for NullPort {
    fn create_ghost(&mut self, _key: &str, _source: PxRect, _at: PxPoint) {}
    fn move_ghost(&mut self, _at: PxPoint) {}
    fn remove_ghost(&mut self) {}
    fn set_indicator_position(&mut self, _indicator: Option<DropIndicator>) {}
}
