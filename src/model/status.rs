use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Workflow status of a schedule item. This is the categorical field that
/// predicate-backed groups match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    InReview,
    Blocked,
    Done,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::NotStarted,
        Status::InProgress,
        Status::InReview,
        Status::Blocked,
        Status::Done,
        Status::Cancelled,
    ];

    /// Label shown in the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Não iniciado",
            Status::InProgress => "Em andamento",
            Status::InReview => "Em revisão",
            Status::Blocked => "Bloqueado",
            Status::Done => "Concluído",
            Status::Cancelled => "Cancelado",
        }
    }

    /// Resolve a free-text status (any casing, with or without accents,
    /// Portuguese or English) through the alias table.
    pub fn parse(text: &str) -> Option<Status> {
        ALIASES.get(normalize(text).as_str()).copied()
    }

    /// Rough completion fraction used when an item carries no explicit progress.
    pub fn default_progress(self) -> f32 {
        match self {
            Status::NotStarted | Status::Cancelled => 0.0,
            Status::InProgress | Status::Blocked => 0.5,
            Status::InReview => 0.9,
            Status::Done => 1.0,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

static ALIASES: LazyLock<HashMap<&'static str, Status>> = LazyLock::new(|| {
    let table: &[(Status, &[&'static str])] = &[
        (
            Status::NotStarted,
            &[
                "nao iniciado", "a fazer", "pendente", "backlog", "novo",
                "not started", "not-started", "todo", "to do", "new", "planned",
            ],
        ),
        (
            Status::InProgress,
            &[
                "em andamento", "andamento", "em progresso", "fazendo",
                "in progress", "in-progress", "active", "started", "doing",
            ],
        ),
        (
            Status::InReview,
            &["em revisao", "revisao", "aprovacao", "in review", "review", "qa"],
        ),
        (
            Status::Blocked,
            &["bloqueado", "pausado", "em espera", "blocked", "paused", "on hold"],
        ),
        (
            Status::Done,
            &[
                "concluido", "finalizado", "entregue", "feito",
                "done", "finished", "complete", "completed",
            ],
        ),
        (
            Status::Cancelled,
            &["cancelado", "arquivado", "cancelled", "canceled", "archived"],
        ),
    ];

    table
        .iter()
        .flat_map(|(status, aliases)| aliases.iter().map(move |a| (*a, *status)))
        .collect()
});

/// Lowercase, trim, collapse inner whitespace and fold the Portuguese accents.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'ê' | 'è' => 'e',
            'í' | 'î' => 'i',
            'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            '_' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_aliases() {
        for status in Status::ALL {
            assert_eq!(Status::parse(status.label()), Some(status));
        }
        assert_eq!(Status::parse("EM ANDAMENTO"), Some(Status::InProgress));
        assert_eq!(Status::parse("  in   progress "), Some(Status::InProgress));
        assert_eq!(Status::parse("Concluido"), Some(Status::Done));
        assert_eq!(Status::parse("not_started"), Some(Status::NotStarted));
    }

    #[test]
    fn unknown_text_has_no_status() {
        assert_eq!(Status::parse("sei la"), None);
        assert_eq!(Status::parse(""), None);
    }

    #[test]
    fn new_items_start_not_started() {
        assert_eq!(Status::default(), Status::NotStarted);
        let status: Status = serde_json::from_str("\"not_started\"").unwrap();
        assert_eq!(status, Status::default());
    }
}
