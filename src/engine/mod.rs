pub mod bar_drag;
pub mod board;
pub mod layout;
pub mod overrides;
pub mod port;
pub mod reorder;
pub mod session;
pub mod store;

pub use bar_drag::{BarDragController, DragCancel, DragCommit, DragMode, DragPreview};
pub use board::{BoardState, Section};
pub use layout::{BarGeometry, DependencyArrow, LayoutOptions, TimelineLayout};
pub use overrides::{apply_status_edit, OverrideStore};
pub use port::{DropIndicator, NullPort, PresentationPort};
pub use reorder::{
    DragSubject, DropSurfaces, DropTarget, GroupSurface, ListReorderController, ReconcileSignal,
    ReorderContext, ReorderKind, ReorderOutcome, Slot,
};
pub use session::SessionGate;
pub use store::{
    AuditEvent, AuditSink, ItemFilter, OrderKind, OrderScope, OrderStore, ScheduleStore,
};
