//! Request descriptor from the URL path and pagination descriptor from the query string.

use crate::error::GatewayError;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// `/{entity}[/{id}]` after the first `api` segment has been dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTarget {
    pub entity: String,
    pub id: Option<String>,
}

impl RequestTarget {
    /// Split `path` into entity and id. Empty segments are skipped, the first `api`
    /// segment is removed wherever it appears, and anything after the id is ignored.
    pub fn from_path(path: &str) -> Self {
        let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if let Some(i) = parts.iter().position(|p| *p == "api") {
            parts.remove(i);
        }
        RequestTarget {
            entity: parts.first().map(|s| s.to_string()).unwrap_or_default(),
            id: parts.get(1).map(|s| s.to_string()),
        }
    }
}

/// Offset/limit slice derived from `page` and `pageSize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Read `page`/`pageSize` from the query. Both must be positive integers when present;
    /// `pageSize` is capped at `max_page_size`.
    pub fn from_query(params: &[(String, String)], max_page_size: u32) -> Result<Self, GatewayError> {
        let mut p = Pagination::default();
        for (k, v) in params {
            match k.as_str() {
                PAGE_PARAM => p.page = parse_positive(PAGE_PARAM, v)?,
                PAGE_SIZE_PARAM => p.page_size = parse_positive(PAGE_SIZE_PARAM, v)?,
                _ => {}
            }
        }
        p.page_size = p.page_size.min(max_page_size);
        Ok(p)
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }

    /// Inclusive row range `[offset, offset + page_size - 1]`.
    pub fn range(&self) -> (u64, u64) {
        let offset = self.offset();
        (offset, offset + self.limit() - 1)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u32, GatewayError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(GatewayError::Validation(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

/// Every query parameter except the pagination pair, in request order, as equality filters.
pub fn filters_from_query(params: &[(String, String)]) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(k, _)| k != PAGE_PARAM && k != PAGE_SIZE_PARAM)
        .cloned()
        .collect()
}
