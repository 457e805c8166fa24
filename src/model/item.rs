use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::Status;

pub type ItemId = Uuid;

/// Whether an item is a summary row (project, phase) or a schedulable leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Group,
    Leaf,
}

/// Bar colour, stored as `#RRGGBB` so snapshots stay hand-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ItemColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid hex color '{}': expected 6 hex digits", s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Colours handed out to new items in round-robin order.
pub const ITEM_PALETTE: &[ItemColor] = &[
    ItemColor::rgb(66, 133, 244),
    ItemColor::rgb(52, 168, 83),
    ItemColor::rgb(171, 71, 188),
    ItemColor::rgb(251, 140, 0),
    ItemColor::rgb(3, 169, 244),
    ItemColor::rgb(229, 57, 53),
    ItemColor::rgb(0, 188, 212),
    ItemColor::rgb(255, 193, 7),
];

impl Default for ItemColor {
    fn default() -> Self {
        Self::rgb(70, 130, 180) // Steel blue
    }
}

impl fmt::Display for ItemColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for ItemColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ItemColor::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// One schedulable row: a project/phase summary or a deliverable/task leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    #[serde(default)]
    pub status: Status,
    /// Items that must finish before this one starts.
    #[serde(default)]
    pub depends_on: BTreeSet<ItemId>,
    #[serde(default)]
    pub color: ItemColor,
    /// Explicit completion in percent (0–100).
    #[serde(default)]
    pub progress_percent: Option<u8>,
}

impl ScheduleItem {
    /// Create a leaf item. A reversed range is clamped to `end = start`.
    pub fn new_leaf(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ItemKind::Leaf,
            name: name.into(),
            start,
            end: end.max(start),
            parent_id: None,
            status: Status::default(),
            depends_on: BTreeSet::new(),
            color: ItemColor::default(),
            progress_percent: None,
        }
    }

    /// Create a summary item (project or phase).
    pub fn new_group(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            kind: ItemKind::Group,
            color: ItemColor::rgb(90, 100, 120),
            ..Self::new_leaf(name, start, end)
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == ItemKind::Leaf
    }

    /// Length in days, counting both ends (a same-day item lasts 1 day).
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Completion in `0.0..=1.0`, falling back to what the status implies.
    pub fn progress(&self) -> f32 {
        match self.progress_percent {
            Some(p) => f32::from(p.min(100)) / 100.0,
            None => self.status.default_progress(),
        }
    }

    /// Set both dates, clamping a degenerate range to `end = start`.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.start = start;
        self.end = end.max(start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn new_leaf_clamps_reversed_range() {
        let item = ScheduleItem::new_leaf("Edit", d(2025, 3, 10), d(2025, 3, 4));
        assert_eq!(item.end, item.start);
        assert_eq!(item.duration_days(), 1);
    }

    #[test]
    fn progress_prefers_explicit_percent() {
        let mut item = ScheduleItem::new_leaf("Mix", d(2025, 3, 1), d(2025, 3, 2));
        item.status = Status::Done;
        assert_eq!(item.progress(), 1.0);
        item.progress_percent = Some(40);
        assert!((item.progress() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn color_hex_round_trips_through_json() {
        let item = ScheduleItem::new_leaf("Color", d(2025, 1, 1), d(2025, 1, 1));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"#4682B4\""));
        let back: ScheduleItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
        assert!(ItemColor::parse_hex("#12").is_err());
    }
}
