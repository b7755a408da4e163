//! Domain primitives for the user subsystem.
//!
//! Newtype identifiers keep user ids from mixing with other integers, and the
//! paging types carry page requests between the service and the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user record.
///
/// # Examples
///
/// ```rust
/// use platform_core::domain::UserId;
///
/// let id = UserId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    /// Creates a new `UserId` from a raw i32 value.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `id` is negative.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// A one-based page request.
///
/// Page `0` is treated as the first page. A zero page size is rejected by the
/// service before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 20;

    #[must_use]
    pub const fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// Zero-based page index as expected by the SeaORM paginator.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }
}

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_items.div_ceil(request.size)
        };

        Self {
            items,
            page: request.index() + 1,
            size: request.size,
            total_items,
            total_pages,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_round_trips_through_i32() {
        let id = UserId::from(7);
        assert_eq!(i32::from(id), 7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn page_zero_is_first_page() {
        assert_eq!(PageRequest::new(0, 10).index(), 0);
        assert_eq!(PageRequest::new(1, 10).index(), 0);
        assert_eq!(PageRequest::new(3, 10).index(), 2);
    }

    #[test]
    fn page_totals_round_up() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(1, 3), 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);

        let empty: Page<i32> = Page::new(vec![], PageRequest::new(0, 5), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.is_empty());
    }
}
