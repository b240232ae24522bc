//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default number of items returned when the caller does not ask for a
/// specific limit.
const DEFAULT_LIMIT: u64 = 25;
/// Maximum number of items per page.
const MAX_LIMIT: u64 = 100;

/// Limit/offset window for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListRange {
    /// Maximum items to return. Clamped to `[1, 100]`.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Items to skip from the start of the matching set.
    #[serde(default)]
    pub offset: u64,
}

impl ListRange {
    /// Create a new range with the limit and offset clamped into bounds.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }.clamped()
    }

    /// Return a copy with the limit clamped to `[1, 100]`. The offset is
    /// unsigned and therefore already `>= 0`.
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_LIMIT),
            offset: self.offset,
        }
    }
}

impl Default for ListRange {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T: Serialize> {
    /// The items in this window.
    pub items: Vec<T>,
    /// Total number of items across the unpaged matching set.
    pub total_items: u64,
}

impl<T: Serialize> Page<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, total_items: u64) -> Self {
        Self { items, total_items }
    }
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}
