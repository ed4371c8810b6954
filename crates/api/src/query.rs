//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped with `clamp_limit` / `clamp_offset` from the db crate.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Page-numbered listing parameters (`?page=`), 1-based.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
}

/// Resolve a requested page against a total row count.
///
/// Returns `(page, num_pages, offset)`. A missing or non-positive page is the
/// first page; a page past the end is the last page. An empty listing still
/// has one (empty) page.
pub fn resolve_page(requested: Option<i64>, total: i64, per_page: i64) -> (i64, i64, i64) {
    let num_pages = ((total + per_page - 1) / per_page).max(1);
    let page = requested.unwrap_or(1).clamp(1, num_pages);
    (page, num_pages, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_by_default() {
        assert_eq!(resolve_page(None, 60, 25), (1, 3, 0));
    }

    #[test]
    fn out_of_range_clamps_to_last_page() {
        assert_eq!(resolve_page(Some(9), 60, 25), (3, 3, 50));
        assert_eq!(resolve_page(Some(0), 60, 25), (1, 3, 0));
    }

    #[test]
    fn empty_listing_has_one_page() {
        assert_eq!(resolve_page(Some(4), 0, 25), (1, 1, 0));
    }

    #[test]
    fn exact_multiple() {
        assert_eq!(resolve_page(Some(2), 50, 25), (2, 2, 25));
    }
}
