//! Shared pagination types for list endpoints.
//!
//! Every list endpoint takes `page` (1-based) and `limit` query parameters and answers with
//! [`Paginated`], which carries the page of items together with the derived page metadata.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items to return (default: 10, max: 100)
///
/// Out of range values are clamped rather than rejected.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, starting at 1
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip for the current page
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// `(offset, limit)`, the shape repository filters take
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.offset(), self.limit())
    }
}

/// Page metadata returned alongside every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total <= 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// A page of items plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T: ToSchema> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T: ToSchema> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: &Pagination, total: i64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(pagination.page(), pagination.limit(), total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(Pagination::new(0, 0).params(), (0, 1));
        assert_eq!(Pagination::new(-4, 1000).params(), (0, MAX_LIMIT));
        assert_eq!(Pagination::new(3, 20).params(), (40, 20));
    }

    #[test]
    fn test_string_encoded_numbers() {
        let p: Pagination = serde_json::from_value(serde_json::json!({"page": "2", "limit": "25"})).unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 25);
    }

    #[test]
    fn test_page_info_math() {
        for (total, limit) in [(0, 10), (1, 10), (10, 10), (11, 10), (99, 7), (100, 100)] {
            let info = PageInfo::new(1, limit, total);
            let expected = (total as f64 / limit as f64).ceil() as i64;
            assert_eq!(info.total_pages, expected, "total={total} limit={limit}");
            assert_eq!(info.has_next, 1 < info.total_pages);
            assert!(!info.has_prev);
        }
    }

    #[test]
    fn test_page_info_flags() {
        let last = PageInfo::new(3, 10, 25);
        assert_eq!(last.total_pages, 3);
        assert!(!last.has_next);
        assert!(last.has_prev);

        let empty = PageInfo::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }
}
