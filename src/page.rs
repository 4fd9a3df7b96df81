//! Cursor-based pagination
//!
//! Transports hand back one [`Page`] per request. [`collect_pages`] walks the
//! cursor chain until the service stops offering a next page.

use std::future::Future;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// First cursor of every listing
pub const FIRST_PAGE: u32 = 1;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<u32>) -> Self {
        Self { items, next_cursor }
    }

    /// A page with no successor
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Parse the `page` query parameter out of a next-page link
    pub fn cursor_from_query(query: Option<&str>) -> Option<u32> {
        query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "page")
            .and_then(|(_, value)| value.parse().ok())
    }

    /// Cursor of an advertised next page. A link without a usable `page`
    /// parameter would end the walk early, so it is a protocol error.
    pub fn required_cursor(operation: &str, link: &str, query: Option<&str>) -> ApiResult<u32> {
        Self::cursor_from_query(query).ok_or_else(|| {
            ApiError::Protocol(format!("{}: next page link has no page cursor: {}", operation, link))
        })
    }
}

/// Fetch every page, concatenating items in receipt order.
///
/// A next cursor that does not move forward is a protocol error.
pub async fn collect_pages<T, F, Fut>(operation: &str, mut fetch: F) -> ApiResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = FIRST_PAGE;

    loop {
        let page = fetch(cursor).await?;
        debug!("{}: page {} returned {} items", operation, cursor, page.items.len());
        items.extend(page.items);

        match page.next_cursor {
            None => break,
            Some(next) if next <= cursor => {
                return Err(ApiError::Protocol(format!(
                    "{}: next page cursor {} does not advance past {}",
                    operation, next, cursor
                )));
            }
            Some(next) => cursor = next,
        }
    }

    Ok(items)
}
