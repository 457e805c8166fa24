use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::status::normalize;
use crate::model::{ItemColor, ItemKind, ScheduleItem, Status, ITEM_PALETTE};

/// Result of a CSV import: parsed items in file order and the number of
/// data rows that could not be used.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub items: Vec<ScheduleItem>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Start,
    End,
    Status,
    Parent,
    DependsOn,
    Kind,
    Color,
    Progress,
}

/// Try parsing a date string with several common formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

fn header_to_column(header: &str) -> Option<Column> {
    let normalized = normalize(header).replace([' ', '-'], "");
    let column = match normalized.as_str() {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "nome" | "tarefa"
        | "entrega" | "atividade" => Column::Name,
        "start" | "startdate" | "from" | "begin" | "inicio" | "datainicio" => Column::Start,
        "end" | "enddate" | "to" | "finish" | "due" | "duedate" | "fim" | "prazo" | "datafim"
        | "entregaem" => Column::End,
        "status" | "state" | "stage" | "situacao" | "etapa" => Column::Status,
        "parent" | "parenttask" | "subtaskof" | "pai" | "projeto" | "fase" => Column::Parent,
        "dependson" | "depends" | "dependencies" | "predecessors" | "dependede"
        | "dependencias" => Column::DependsOn,
        "kind" | "type" | "tipo" => Column::Kind,
        "color" | "colour" | "cor" => Column::Color,
        "progress" | "percent" | "progresso" | "%" => Column::Progress,
        _ => return None,
    };
    Some(column)
}

fn parse_kind(s: &str) -> Option<ItemKind> {
    match normalize(s).as_str() {
        "group" | "summary" | "project" | "phase" | "grupo" | "projeto" | "fase" | "resumo" => {
            Some(ItemKind::Group)
        }
        "leaf" | "task" | "deliverable" | "tarefa" | "entrega" => Some(ItemKind::Leaf),
        _ => None,
    }
}

#[derive(Default)]
struct Row {
    name: String,
    start: String,
    end: String,
    status: String,
    parent: String,
    depends_on: String,
    kind: String,
    color: String,
    progress: String,
}

/// Import schedule items from a CSV file.
pub fn import_csv(path: &Path) -> Result<CsvImport, StoreError> {
    let content = std::fs::read_to_string(path)?;
    let import = parse_csv(&content)?;
    tracing::info!(
        path = %path.display(),
        items = import.items.len(),
        skipped = import.skipped,
        "csv imported"
    );
    Ok(import)
}

/// Parse CSV text. The delimiter (comma, semicolon, tab) is detected from the
/// header line and headers are matched loosely in English and Portuguese.
/// Parents and dependencies refer to other rows by name.
pub fn parse_csv(content: &str) -> Result<CsvImport, StoreError> {
    let first_line = content.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers.iter().map(header_to_column).collect();
    let has = |c: Column| columns.contains(&Some(c));
    if !has(Column::Name) || !has(Column::Start) || !has(Column::End) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(StoreError::Rejected(format!(
            "CSV sem as colunas obrigatórias (nome, início, fim). Cabeçalhos: {:?}",
            found
        )));
    }
    let explicit_kind = has(Column::Kind);

    let mut items: Vec<ScheduleItem> = Vec::new();
    let mut links: Vec<(String, Vec<String>)> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unreadable csv row");
                skipped += 1;
                continue;
            }
        };

        let mut row = Row::default();
        for (field, column) in record.iter().zip(&columns) {
            let slot = match column {
                Some(Column::Name) => &mut row.name,
                Some(Column::Start) => &mut row.start,
                Some(Column::End) => &mut row.end,
                Some(Column::Status) => &mut row.status,
                Some(Column::Parent) => &mut row.parent,
                Some(Column::DependsOn) => &mut row.depends_on,
                Some(Column::Kind) => &mut row.kind,
                Some(Column::Color) => &mut row.color,
                Some(Column::Progress) => &mut row.progress,
                None => continue,
            };
            *slot = field.to_string();
        }

        if row.name.is_empty() {
            skipped += 1;
            continue;
        }
        let (Some(start), Some(end)) = (parse_date(&row.start), parse_date(&row.end)) else {
            tracing::warn!(line, start = %row.start, end = %row.end, "skipping row with invalid dates");
            skipped += 1;
            continue;
        };

        let mut item = match parse_kind(&row.kind) {
            Some(ItemKind::Group) => ScheduleItem::new_group(row.name, start, end),
            _ => {
                let mut leaf = ScheduleItem::new_leaf(row.name, start, end);
                leaf.color = ITEM_PALETTE[items.len() % ITEM_PALETTE.len()];
                leaf
            }
        };
        if !row.status.is_empty() {
            item.status = Status::parse(&row.status).unwrap_or_else(|| {
                tracing::warn!(line, status = %row.status, "unknown status, using default");
                Status::default()
            });
        }
        if let Ok(color) = ItemColor::parse_hex(&row.color) {
            item.color = color;
        }
        item.progress_percent = row
            .progress
            .trim_end_matches('%')
            .trim()
            .parse::<u8>()
            .ok()
            .map(|p| p.min(100));

        let deps = row
            .depends_on
            .split(['|', ',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        links.push((row.parent, deps));
        items.push(item);
    }

    if items.is_empty() {
        return Err(StoreError::Rejected(format!(
            "Nenhum item válido no CSV ({} linhas ignoradas)",
            skipped
        )));
    }

    resolve_links(&mut items, &links, explicit_kind);
    Ok(CsvImport { items, skipped })
}

/// Second pass: resolve parent and dependency names to ids.
fn resolve_links(items: &mut [ScheduleItem], links: &[(String, Vec<String>)], explicit_kind: bool) {
    let by_name: HashMap<String, uuid::Uuid> = items
        .iter()
        .map(|i| (i.name.to_lowercase(), i.id))
        .collect();
    let lookup = |name: &str| by_name.get(&name.to_lowercase()).copied();

    let mut parents = HashSet::new();
    for (item, (parent, deps)) in items.iter_mut().zip(links) {
        if !parent.is_empty() {
            match lookup(parent) {
                Some(pid) if pid != item.id => {
                    item.parent_id = Some(pid);
                    parents.insert(pid);
                }
                Some(_) => {}
                None => tracing::warn!(parent = %parent, item = %item.name, "parent not found"),
            }
        }
        for dep in deps {
            match lookup(dep) {
                Some(id) if id != item.id => {
                    item.depends_on.insert(id);
                }
                Some(_) => {}
                None => tracing::warn!(dependency = %dep, item = %item.name, "dependency not found"),
            }
        }
    }

    // Without a kind column, anything that has children is a summary.
    if !explicit_kind {
        for item in items.iter_mut().filter(|i| parents.contains(&i.id)) {
            item.kind = ItemKind::Group;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_file_with_portuguese_headers() {
        let csv = "Tarefa;Início;Fim;Status;Projeto;Depende de\n\
                   Campanha;01/03/2025;20/03/2025;;;\n\
                   Roteiro;03/03/2025;05/03/2025;Concluído;Campanha;\n\
                   Gravação;06/03/2025;10/03/2025;em andamento;Campanha;Roteiro\n";
        let import = parse_csv(csv).unwrap();
        assert_eq!(import.skipped, 0);
        let [campaign, script, shoot] = &import.items[..] else {
            panic!("expected three items");
        };
        assert_eq!(campaign.kind, ItemKind::Group);
        assert_eq!(script.status, Status::Done);
        assert_eq!(script.parent_id, Some(campaign.id));
        assert_eq!(shoot.status, Status::InProgress);
        assert!(shoot.depends_on.contains(&script.id));
        assert_eq!(shoot.end, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn comma_file_skips_bad_rows_and_defaults_unknown_status() {
        let csv = "name,start,end,status,kind\n\
                   Mix,2025-03-01,2025-03-02,whatever,task\n\
                   Broken,not a date,2025-03-02,,\n\
                   ,2025-03-01,2025-03-02,,\n";
        let import = parse_csv(csv).unwrap();
        assert_eq!(import.items.len(), 1);
        assert_eq!(import.skipped, 2);
        assert_eq!(import.items[0].status, Status::NotStarted);
        assert!(import.items[0].is_leaf());
    }

    #[test]
    fn missing_required_columns_is_rejected() {
        let err = parse_csv("name,status\nA,done\n").unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.csv");
        std::fs::write(&path, "Task\tStart\tEnd\nThumb\t2025-03-01\t2025-02-27\n").unwrap();
        let import = import_csv(&path).unwrap();
        assert_eq!(import.items[0].start, import.items[0].end);
    }
}
