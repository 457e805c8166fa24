pub mod gantt_chart;
pub mod overlay;
pub mod task_table;
pub mod theme;
pub mod toolbar;

/// egui reports a single primary pointer; every session is keyed to it.
pub const MOUSE_POINTER: u64 = 0;
