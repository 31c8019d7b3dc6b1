use crate::config::types::{ArchiveConfig, ClientConfig, Config, SiteConfig, TriggerConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_client_config(&config.client)?;
    validate_archive_config(&config.archive)?;
    validate_trigger_config(&config.trigger)?;
    Ok(())
}

/// Validates the source site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got '{}'",
            base.scheme()
        )));
    }

    // Relative listing and item paths are joined onto the base URL, which
    // only behaves as expected when the base ends in a slash
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(
            "base-url must end with a trailing slash".to_string(),
        ));
    }

    if config.content_marker.is_empty() {
        return Err(ConfigError::Validation(
            "content-marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the client identification configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.identifier.is_empty() {
        return Err(ConfigError::Validation(
            "client identifier cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the archive configuration
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the trigger endpoint configuration
fn validate_trigger_config(config: &TriggerConfig) -> Result<(), ConfigError> {
    config
        .listen_addr
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::Validation(format!("Invalid listen-addr: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            site: SiteConfig {
                base_url: "https://news.ycombinator.com/".to_string(),
                front_path: String::new(),
                newest_path: "newest".to_string(),
                content_marker: "Hacker News".to_string(),
            },
            client: ClientConfig {
                identifier: "Treeline/1.0 (archive@example.com)".to_string(),
            },
            archive: ArchiveConfig {
                database_path: "./treeline.db".to_string(),
            },
            trigger: TriggerConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_base_url_without_trailing_slash() {
        let mut config = valid_config();
        config.site.base_url = "https://news.ycombinator.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut config = valid_config();
        config.site.base_url = "ftp://example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_empty_marker() {
        let mut config = valid_config();
        config.site.content_marker = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_identifier() {
        let mut config = valid_config();
        config.client.identifier = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_listen_addr() {
        let mut config = valid_config();
        config.trigger.listen_addr = "not-an-addr".to_string();
        assert!(validate(&config).is_err());
    }
}
