use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// Sorting options for root comments and post listings, always descending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    New,
    Top,
}

/// A cursor page: rows strictly after `cursor` in `order`.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub cursor: Option<Uuid>,
    pub limit: u32,
    pub order: SortOrder,
}

impl PageRequest {
    pub fn new(cursor: Option<Uuid>, limit: Option<u32>, order: Option<SortOrder>) -> Self {
        Self {
            cursor,
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            order: order.unwrap_or_default(),
        }
    }

    /// Cursor for the following page, present only when this page came back full.
    pub fn next_cursor(&self, ids: &[Uuid]) -> Option<Uuid> {
        if ids.len() >= self.limit as usize {
            ids.last().copied()
        } else {
            None
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}
