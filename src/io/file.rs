use std::path::Path;

use crate::error::StoreError;
use crate::model::Schedule;

/// Save a schedule to a JSON file.
pub fn save_schedule(schedule: &Schedule, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(schedule)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), items = schedule.items.len(), "schedule saved");
    Ok(())
}

/// Load a schedule from a JSON file.
pub fn load_schedule(path: &Path) -> Result<Schedule, StoreError> {
    let json = std::fs::read_to_string(path)?;
    let schedule: Schedule = serde_json::from_str(&json)?;
    tracing::info!(path = %path.display(), items = schedule.items.len(), "schedule loaded");
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScheduleItem, Status};
    use chrono::NaiveDate;

    #[test]
    fn snapshot_keeps_items_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.json");
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        let mut schedule = Schedule::new("Estúdio");
        let a = ScheduleItem::new_leaf("Roteiro", day, day);
        let mut b = ScheduleItem::new_leaf("Gravação", day, day);
        b.depends_on.insert(a.id);
        b.status = Status::InReview;
        schedule.items = vec![a, b.clone()];

        save_schedule(&schedule, &path).unwrap();
        let loaded = load_schedule(&path).unwrap();
        assert_eq!(loaded.name, "Estúdio");
        assert_eq!(loaded.items[1], b);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_schedule(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
