//! Node processing
//!
//! Takes the oldest pending identifier, fetches its item page, parses the
//! page into archived records, and enqueues whatever other identifiers the
//! page referenced. This is where most of each cycle's work happens.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser;
use crate::storage::Storage;
use crate::Result;
use chrono::{DateTime, Utc};
use scraper::Html;

/// Processes the oldest pending item, if any
///
/// Records parse per structural block: a malformed block is logged and
/// skipped, and each successful record is written immediately so a later
/// failure cannot undo it. A fetch failure propagates before any queue
/// bookkeeping, leaving the pending entry in place for a future
/// invocation. The discovered-identifier enqueue, the pending delete, and
/// the processed-count bump commit together at the end.
pub async fn process_next<S: Storage>(
    storage: &mut S,
    fetcher: &Fetcher,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(entry) = storage.oldest_pending()? else {
        tracing::debug!("work queue is empty");
        return Ok(());
    };

    let url = fetcher.item_url(entry.id)?;
    let body = fetcher.fetch(&url).await?;
    storage.record_raw_page(url.as_str(), body.as_bytes())?;

    let doc = Html::parse_document(&body);
    let mut referenced = parser::extract_item_ids(&doc);
    let outcomes = parser::parse_item_page(&doc, entry.id, now);
    drop(doc);

    let mut persisted = 0u64;
    for outcome in outcomes {
        match outcome {
            Ok(record) => {
                let id = record.id;
                storage.put_item(&record)?;
                referenced.remove(&id);
                persisted += 1;
                tracing::info!("archived item {}", id);
            }
            Err(e) => {
                tracing::warn!("skipping malformed block on {}: {}", url, e);
            }
        }
    }

    let discovered = storage.filter_unarchived(&referenced)?;
    if !discovered.is_empty() {
        tracing::info!("discovered {} referenced identifiers", discovered.len());
    }

    storage.commit_processed(entry.id, &discovered, persisted)?;
    tracing::info!("processed {} ({} records)", entry.id, persisted);
    Ok(())
}
