//! Page-number pagination for list endpoints.
//!
//! Responses use a fixed envelope: total `count`, absolute `next` /
//! `previous` page URLs (null at the edges), and the `results` page.
//! The page size is fixed by configuration; clients select a page
//! with `?page=N` (1-based).

use serde::{Deserialize, Serialize};

use crate::{config::config, Error, Result};

/// Query parameters for paginated list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Paginated response envelope.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Resolve a 1-based page number into a (limit, offset) pair,
/// rejecting pages past the end of the collection.
pub fn page_bounds(page: u32, count: i64) -> Result<(i64, i64)> {
    let page_size = config().api.page_size as i64;

    if page == 0 {
        return Err(Error::NotFound("Invalid page.".to_string()));
    }

    let offset = (page as i64 - 1) * page_size;
    if page > 1 && offset >= count {
        return Err(Error::NotFound("Invalid page.".to_string()));
    }

    Ok((page_size, offset))
}

/// Build the response envelope for one page of results.
pub fn envelope<T>(path: &str, page: u32, count: i64, results: Vec<T>) -> Page<T> {
    let config = config();
    let page_size = config.api.page_size as i64;
    let base = &config.server.public_url;

    let next = if (page as i64) * page_size < count {
        Some(format!("{}{}?page={}", base, path, page + 1))
    } else {
        None
    };
    let previous = if page > 1 {
        Some(format!("{}{}?page={}", base, path, page - 1))
    } else {
        None
    };

    Page {
        count,
        next,
        previous,
        results,
    }
}
