//! Pagination drivers for the two listing styles the platforms use.
//!
//! - Numbered pages (`?page=1`, `?page=2`, ...) stop at the first empty page.
//! - Linked pages follow a `next` URL until it is absent.
//!
//! Both are sequential: one request in flight at a time.

use std::future::Future;

use tracing::{debug, warn};

use crate::http::ApiError;

/// One page of a linked listing.
#[derive(Debug, Clone)]
pub struct LinkedPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Request pages 1, 2, ... until one comes back empty.
pub async fn collect_numbered_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    let mut output = Vec::new();
    let mut page = 1u32;
    loop {
        let items = fetch_page(page).await?;
        if items.is_empty() {
            debug!(page, total = output.len(), "Reached empty page, stopping");
            break;
        }
        debug!(page, count = items.len(), "Fetched page");
        output.extend(items);
        page += 1;
    }
    Ok(output)
}

/// Follow `next` links starting at `first_url` until none is given.
pub async fn collect_linked_pages<T, F, Fut>(
    first_url: String,
    mut fetch: F,
) -> Result<Vec<T>, ApiError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<LinkedPage<T>, ApiError>>,
{
    let mut output = Vec::new();
    let mut next = Some(first_url);
    while let Some(url) = next.take() {
        let page = fetch(url.clone()).await?;
        debug!(url = %url, count = page.items.len(), "Fetched linked page");
        output.extend(page.items);
        next = match page.next {
            Some(link) if link.is_empty() => None,
            Some(link) if link == url => {
                warn!(url = %url, "Page links to itself, stopping pagination");
                None
            }
            other => other,
        };
    }
    Ok(output)
}
