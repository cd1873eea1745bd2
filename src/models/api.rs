use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(page: PageRef, total: i64) -> Self {
        let end = page.page as i64 * page.limit as i64;
        Self {
            next: (end < total).then(|| PageRef {
                page: page.page + 1,
                limit: page.limit,
            }),
            prev: (page.page > 1).then(|| PageRef {
                page: page.page - 1,
                limit: page.limit,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: PageRef) -> Self {
        Self {
            success: true,
            total,
            pagination: Pagination::compute(page, total),
            data,
        }
    }
}

/// Query string accepted by list endpoints. Filters a table does not have
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub market: Option<String>,
    pub account_id: Option<Uuid>,
    pub investment_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
}

impl ListParams {
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        let page = self.page_ref();
        (page.page as i64 - 1) * page.limit as i64
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Query string of the live scrape views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub market: Option<String>,
}

impl SearchParams {
    pub fn matches(&self, fields: &[&str]) -> bool {
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields.iter().any(|f| f.to_lowercase().contains(&term))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_next_but_no_prev() {
        let p = Pagination::compute(PageRef { page: 1, limit: 25 }, 60);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 25 }));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn last_page_has_prev_but_no_next() {
        let p = Pagination::compute(PageRef { page: 3, limit: 25 }, 60);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 2, limit: 25 }));

        let exact = Pagination::compute(PageRef { page: 2, limit: 30 }, 60);
        assert_eq!(exact.next, None);
    }

    #[test]
    fn list_params_clamp_page_and_limit() {
        let params = ListParams {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(params.page_ref(), PageRef { page: 1, limit: MAX_PAGE_SIZE });
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(params.page_ref().limit, DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn empty_pagination_serializes_as_empty_object() {
        let json = serde_json::to_value(Pagination::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let params = SearchParams {
            search: Some("gold".into()),
            market: None,
        };
        assert!(params.matches(&["Gram Altın", "GOLD-GRAM"]));
        assert!(!params.matches(&["Silver"]));
        assert!(SearchParams::default().matches(&["anything"]));
    }
}
