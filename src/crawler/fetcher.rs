//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the archiver:
//! - Building the HTTP client with the fixed client identifier string
//! - Resolving listing and item URLs against the configured base
//! - Fetching pages with status and content-marker checks
//!
//! Fetches are never retried here; a failed fetch aborts the current crawl
//! step and the pending entry stays queued for a later invocation.

use crate::config::{ClientConfig, SiteConfig};
use crate::{ArchiveError, Result};
use std::time::Duration;
use url::Url;

/// HTTP fetcher bound to one source site
pub struct Fetcher {
    client: reqwest::Client,
    base: Url,
    front_path: String,
    newest_path: String,
    marker: String,
}

impl Fetcher {
    /// Creates a fetcher for the configured site
    pub fn new(site: &SiteConfig, client: &ClientConfig) -> Result<Self> {
        let base = Url::parse(&site.base_url)?;

        let http = reqwest::Client::builder()
            .user_agent(client.identifier.clone())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client: http,
            base,
            front_path: site.front_path.clone(),
            newest_path: site.newest_path.clone(),
            marker: site.content_marker.clone(),
        })
    }

    /// URL of the front-page listing
    pub fn front_page_url(&self) -> Result<Url> {
        Ok(self.base.join(&self.front_path)?)
    }

    /// URL of the newest-items listing
    pub fn newest_page_url(&self) -> Result<Url> {
        Ok(self.base.join(&self.newest_path)?)
    }

    /// URL of an item page
    pub fn item_url(&self, id: u64) -> Result<Url> {
        Ok(self.base.join(&format!("item?id={}", id))?)
    }

    /// Fetches a page, returning its body
    ///
    /// A non-success status or a body without the configured content marker
    /// is a fetch failure.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ArchiveError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ArchiveError::Http {
            url: url.to_string(),
            source: e,
        })?;

        if !body.contains(&self.marker) {
            return Err(ArchiveError::MissingMarker {
                url: url.to_string(),
            });
        }

        tracing::info!("retrieved {}", url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_fetcher() -> Fetcher {
        let site = SiteConfig {
            base_url: "https://news.ycombinator.com/".to_string(),
            front_path: String::new(),
            newest_path: "newest".to_string(),
            content_marker: "Hacker News".to_string(),
        };
        let client = ClientConfig {
            identifier: "Treeline/1.0 (archive@example.com)".to_string(),
        };
        Fetcher::new(&site, &client).unwrap()
    }

    #[test]
    fn test_front_page_url() {
        let fetcher = test_fetcher();
        assert_eq!(
            fetcher.front_page_url().unwrap().as_str(),
            "https://news.ycombinator.com/"
        );
    }

    #[test]
    fn test_newest_page_url() {
        let fetcher = test_fetcher();
        assert_eq!(
            fetcher.newest_page_url().unwrap().as_str(),
            "https://news.ycombinator.com/newest"
        );
    }

    #[test]
    fn test_item_url() {
        let fetcher = test_fetcher();
        assert_eq!(
            fetcher.item_url(8863).unwrap().as_str(),
            "https://news.ycombinator.com/item?id=8863"
        );
    }
}
