use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// What sort of work a to-do tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoKind {
    Issue,
    #[default]
    Task,
    Story,
}

impl TodoKind {
    pub const ALL: [Self; 3] = [Self::Issue, Self::Task, Self::Story];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Task => "task",
            Self::Story => "story",
        }
    }
}

/// Workflow status. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Backlog,
    #[default]
    Todo,
    InProgress,
    Done,
    Canceled,
}

impl Status {
    pub const ALL: [Self; 5] = [
        Self::Backlog,
        Self::Todo,
        Self::InProgress,
        Self::Done,
        Self::Canceled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TodoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            })
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "status",
                got: s.to_string(),
            })
    }
}

/// An issue, task or story owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub kind: TodoKind,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    /// Sorted label ids.
    pub labels: Vec<i64>,
    /// Sorted assignee identifiers.
    pub assignees: Vec<String>,
    pub author: String,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub kind: TodoKind,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    pub labels: Vec<i64>,
    pub assignees: Vec<String>,
}

/// Partial update of a to-do.
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the value. `labels` and `assignees` replace the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub kind: Option<TodoKind>,
    pub status: Option<Status>,
    pub due_date: Option<Option<NaiveDate>>,
    pub labels: Option<Vec<i64>>,
    pub assignees: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::{Status, TodoKind};
    use std::str::FromStr;

    #[test]
    fn enum_json_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&TodoKind::Story).unwrap(), "\"story\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"canceled\"").unwrap(),
            Status::Canceled
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for status in Status::ALL {
            assert_eq!(Status::from_str(&status.to_string()).unwrap(), status);
        }
        for kind in TodoKind::ALL {
            assert_eq!(TodoKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = "later".parse::<Status>().unwrap_err();
        assert_eq!(err.to_string(), "invalid status: 'later'");
        assert!("Task".parse::<TodoKind>().is_err());
    }
}
