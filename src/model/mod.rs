pub mod geometry;
pub mod group;
pub mod item;
pub mod schedule;
pub mod status;
pub mod timeline;

pub use geometry::{PxPoint, PxRect};
pub use group::{Group, GroupId, GroupMembership, GroupRule, GroupSet};
pub use item::{ItemColor, ItemId, ItemKind, ScheduleItem, ITEM_PALETTE};
pub use schedule::Schedule;
pub use status::Status;
pub use timeline::{CellWidths, HeaderBand, ScaleConfig, ScaleMode, TimeColumn};
