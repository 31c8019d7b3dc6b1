use serde::Deserialize;

/// Main configuration structure for Treeline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub client: ClientConfig,
    pub archive: ArchiveConfig,
    pub trigger: TriggerConfig,
}

/// Source site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the forum, with a trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing path for the front page, relative to the base URL
    #[serde(rename = "front-path", default)]
    pub front_path: String,

    /// Listing path for the newest-items page, relative to the base URL
    #[serde(rename = "newest-path", default = "default_newest_path")]
    pub newest_path: String,

    /// Text that every genuine page from the site contains; a response
    /// without it is treated as a fetch failure
    #[serde(rename = "content-marker")]
    pub content_marker: String,
}

fn default_newest_path() -> String {
    "newest".to_string()
}

/// HTTP client identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Fixed identifier string sent as the User-Agent on every request
    pub identifier: String,
}

/// Archive storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Trigger endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    /// Address the trigger HTTP server listens on
    #[serde(rename = "listen-addr")]
    pub listen_addr: String,
}
