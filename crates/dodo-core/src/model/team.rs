use serde::{Deserialize, Serialize};

/// A group of members and managers that owns projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Sorted member identifiers.
    pub members: Vec<String>,
    /// Sorted manager identifiers; always a subset of `members`.
    pub managers: Vec<String>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl Team {
    #[must_use]
    pub fn is_member(&self, who: &str) -> bool {
        self.members.iter().any(|m| m == who)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub managers: Vec<String>,
}

/// Partial update. `description: Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}
