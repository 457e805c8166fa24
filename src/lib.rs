//! Scheduling timeline and drag-and-drop reordering engine for the studio
//! operations dashboard.
//!
//! [`model`] holds the data and the time axis, [`engine`] the layout and the
//! interaction controllers, [`io`] the file-backed collaborators. [`app`] and
//! [`ui`] host everything in an egui window.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod ui;

pub use config::{DataPaths, EngineConfig};
pub use error::{EngineError, StoreError};
