//! Offset pagination over the content API.
//!
//! Pages are requested with `first` (page size) and `skip` (offset), starting at
//! offset zero, until a page comes back shorter than requested. The collected
//! records keep the order the source returned them in.

use crate::errors::{Error, Result};
use crate::throttle::Throttle;
use std::future::Future;
use tracing::{debug, error, info};

/// Pulls every record through `fetch_page(first, skip)` and concatenates the pages.
///
/// Any page failure aborts the whole fetch; records from earlier pages are dropped.
///
/// # Errors
/// Returns [`Error::Config`] for a zero page size, otherwise the first page error.
pub async fn fetch_all<T, F, Fut>(
    entity: &str,
    page_size: u32,
    throttle: &Throttle,
    mut fetch_page: F,
) -> Result<Vec<T>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if page_size == 0 {
        return Err(Error::Config {
            message: "page size must be at least 1".to_string(),
        });
    }

    info!("Fetching {entity} from source");
    let mut records = Vec::new();
    let mut skip: u32 = 0;

    loop {
        if skip > 0 {
            throttle.pause().await;
        }

        debug!(entity, first = page_size, skip, "Requesting page");
        let page = fetch_page(page_size, skip)
            .await
            .inspect_err(|e| error!("Error fetching {entity} at offset {skip}: {e}"))?;

        let fetched = page.len();
        records.extend(page);
        info!("Fetched {fetched} {entity} (total: {})", records.len());

        if fetched < page_size as usize {
            break;
        }

        skip = skip.checked_add(page_size).ok_or_else(|| Error::Source {
            message: format!("{entity} offset overflowed after {} records", records.len()),
        })?;
    }

    Ok(records)
}
