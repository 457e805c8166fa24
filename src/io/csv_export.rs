use std::collections::HashMap;
use std::path::Path;

use crate::error::StoreError;
use crate::model::{ItemId, ItemKind, ScheduleItem};

const HEADER: [&str; 8] = ["Tarefa", "Início", "Fim", "Status", "Tipo", "Projeto", "Depende de", "Cor"];

/// Export items to a semicolon-delimited CSV file that [`import_csv`] reads
/// back. Dates are formatted as DD/MM/YYYY; parents and dependencies are
/// written by name. Returns the number of items written.
///
/// [`import_csv`]: super::import_csv
pub fn export_csv(items: &[ScheduleItem], path: &Path) -> Result<usize, StoreError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    write_items(&mut wtr, items)?;
    wtr.flush()?;
    tracing::info!(path = %path.display(), items = items.len(), "csv exported");
    Ok(items.len())
}

fn write_items<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    items: &[ScheduleItem],
) -> Result<(), StoreError> {
    let names: HashMap<ItemId, &str> = items.iter().map(|i| (i.id, i.name.as_str())).collect();
    wtr.write_record(HEADER)?;
    for item in items {
        let parent = item
            .parent_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or_default();
        let deps: Vec<&str> = item
            .depends_on
            .iter()
            .filter_map(|id| names.get(id).copied())
            .collect();
        let kind = match item.kind {
            ItemKind::Group => "projeto",
            ItemKind::Leaf => "tarefa",
        };
        wtr.write_record([
            item.name.clone(),
            item.start.format("%d/%m/%Y").to_string(),
            item.end.format("%d/%m/%Y").to_string(),
            item.status.label().to_string(),
            kind.to_string(),
            parent.to_string(),
            deps.join("|"),
            item.color.to_string(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_import::import_csv;
    use crate::model::Status;
    use chrono::NaiveDate;

    #[test]
    fn exported_file_imports_with_same_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();

        let project = ScheduleItem::new_group("Lançamento", day(1), day(20));
        let mut script = ScheduleItem::new_leaf("Roteiro", day(2), day(4));
        script.parent_id = Some(project.id);
        script.status = Status::InReview;
        let mut edit = ScheduleItem::new_leaf("Edição", day(5), day(9));
        edit.parent_id = Some(project.id);
        edit.depends_on.insert(script.id);

        let written = export_csv(&[project, script.clone(), edit.clone()], &path).unwrap();
        assert_eq!(written, 3);

        let import = import_csv(&path).unwrap();
        let [p, s, e] = &import.items[..] else {
            panic!("expected three items");
        };
        assert_eq!(p.kind, ItemKind::Group);
        assert_eq!(s.status, Status::InReview);
        assert_eq!(s.color, script.color);
        assert_eq!(e.parent_id, Some(p.id));
        assert!(e.depends_on.contains(&s.id));
        assert_eq!((e.start, e.end), (edit.start, edit.end));
    }
}
