//! Frontier discovery
//!
//! Fetches one listing page (front page or newest page), extracts the item
//! identifiers it references, and enqueues the ones with no archived record
//! yet, raising the known upper bound when the listing shows a higher
//! identifier than anything seen before.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser;
use crate::storage::Storage;
use crate::Result;
use scraper::Html;
use url::Url;

/// Which listing a discovery step reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    FrontPage,
    Newest,
}

/// Runs one frontier discovery step against the given listing
///
/// The fetch and raw-page append happen outside the bookkeeping
/// transaction; the coverage-bound update and the pending inserts commit
/// together.
pub async fn discover_listing<S: Storage>(
    storage: &mut S,
    fetcher: &Fetcher,
    listing: Listing,
) -> Result<()> {
    let url = match listing {
        Listing::FrontPage => fetcher.front_page_url()?,
        Listing::Newest => fetcher.newest_page_url()?,
    };

    let body = fetcher.fetch(&url).await?;
    storage.record_raw_page(url.as_str(), body.as_bytes())?;

    let new_ids = referenced_unarchived(storage, &url, &body)?;
    if new_ids.is_empty() {
        tracing::info!("no new identifiers on {}", url);
        return Ok(());
    }

    let mut coverage = storage.coverage_state()?;
    let highest = new_ids[new_ids.len() - 1];
    let raised = if highest > coverage.upper_bound {
        coverage.upper_bound = highest;
        tracing::info!("new upper bound: {}", highest);
        true
    } else {
        false
    };

    storage.commit_discovery(raised.then_some(&coverage), &new_ids)?;
    tracing::info!("discovered {} new identifiers on {}", new_ids.len(), url);
    Ok(())
}

/// Extracts referenced identifiers from a listing body and filters out the
/// ones already archived
///
/// Only the content store is consulted; an identifier that is merely
/// pending is re-enqueued, which overwrites its queue entry.
fn referenced_unarchived<S: Storage>(storage: &S, url: &Url, body: &str) -> Result<Vec<u64>> {
    let doc = Html::parse_document(body);
    let ids = parser::extract_item_ids(&doc);
    tracing::debug!("{} referenced identifiers on {}", ids.len(), url);
    Ok(storage.filter_unarchived(&ids)?)
}
