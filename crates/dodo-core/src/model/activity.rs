//! Audit-log entries recorded for every field change on a to-do.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Which aspect of a to-do an activity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Title,
    Description,
    Kind,
    Status,
    DueDate,
    Labels,
    Assignees,
}

impl ActivityKind {
    pub const ALL: [Self; 8] = [
        Self::Created,
        Self::Title,
        Self::Description,
        Self::Kind,
        Self::Status,
        Self::DueDate,
        Self::Labels,
        Self::Assignees,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Title => "title",
            Self::Description => "description",
            Self::Kind => "kind",
            Self::Status => "status",
            Self::DueDate => "due_date",
            Self::Labels => "labels",
            Self::Assignees => "assignees",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "activity kind",
                got: s.to_string(),
            })
    }
}

/// One persisted audit-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub todo_id: i64,
    pub author: String,
    pub kind: ActivityKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at_us: i64,
}

/// A field change that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub kind: ActivityKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(kind: ActivityKind, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            kind,
            old_value,
            new_value,
        }
    }
}
