//! crates/educonnect_core/src/pagination.rs
//!
//! Page/limit arithmetic shared by every paginated listing.

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 6;
pub const MAX_LIMIT: u64 = 100;

/// A normalised, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values. Missing or non-positive values
    /// fall back to the defaults and `limit` is capped at `MAX_LIMIT`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page
            .filter(|p| *p > 0)
            .map(|p| p as u64)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .map(|l| (l as u64).min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results together with the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.request.limit)
    }

    pub fn current_page(&self) -> u64 {
        self.request.page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// `ceil(total / limit)`.
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_or_non_positive_values() {
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
        let req = PageRequest::new(Some(0), Some(-3));
        assert_eq!((req.page(), req.limit()), (DEFAULT_PAGE, DEFAULT_LIMIT));
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageRequest::new(Some(1), Some(10_000)).limit(), MAX_LIMIT);
    }

    #[test]
    fn offset_skips_whole_pages() {
        assert_eq!(PageRequest::new(Some(1), Some(6)).offset(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(6)).offset(), 12);
        assert_eq!(PageRequest::new(Some(99), Some(6)).offset(), 588);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 6), 0);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
        assert_eq!(total_pages(14, 6), 3);
    }
}
