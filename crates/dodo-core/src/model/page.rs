//! Pagination and sort direction shared by every search endpoint.

use serde::{Deserialize, Serialize};

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Upper bound for a single page.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Offset/limit window over a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Build a page from optional request values, clamping `limit` to
    /// `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// The same window with `limit` clamped into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(Some(self.offset), Some(self.limit))
    }

    pub(crate) fn sql_clause(self) -> String {
        let page = self.clamped();
        format!(" LIMIT {} OFFSET {}", page.limit, page.offset)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> PageOf<T> {
    pub(crate) fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        let page = page.clamped();
        Self {
            items,
            total,
            offset: page.offset,
            limit: page.limit,
        }
    }

    /// True when more matches exist past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.items.len() as u64) < self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
