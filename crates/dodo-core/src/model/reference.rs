use serde::{Deserialize, Serialize};

/// An external URL attached to a to-do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: i64,
    pub todo_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub created_at_us: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReference {
    pub todo_id: i64,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePatch {
    pub url: Option<String>,
    pub title: Option<Option<String>>,
}
