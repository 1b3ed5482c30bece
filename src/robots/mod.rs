//! Robots.txt handling module
//!
//! This module provides functionality for fetching and parsing robots.txt files.
//! A crawl loads the rules once for its origin; the `RobotsSource` trait is the
//! seam tests use to simulate unreachable or restrictive sites.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Supplies the exclusion rules for a site origin
#[async_trait]
pub trait RobotsSource: Send + Sync {
    /// Loads the rules for `origin` (`scheme://host[:port]/`)
    async fn load(&self, origin: &Url) -> Result<ParsedRobots, FetchError>;
}

/// Fetches `<origin>/robots.txt` over HTTP
#[derive(Debug, Clone)]
pub struct HttpRobotsSource {
    client: Client,
}

impl HttpRobotsSource {
    /// Creates a source that reuses the crawler's HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RobotsSource for HttpRobotsSource {
    async fn load(&self, origin: &Url) -> Result<ParsedRobots, FetchError> {
        let robots_url = origin
            .join("/robots.txt")
            .map_err(|e| FetchError::Network {
                url: origin.to_string(),
                message: e.to_string(),
            })?;

        fetch_robots(&self.client, &robots_url).await
    }
}

/// Fetches and parses robots.txt
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Parsed rules; 401 and 403 forbid everything, any
///   other 4xx response means the site has none
/// * `Err(FetchError)` - Network failure or server error
pub async fn fetch_robots(client: &Client, robots_url: &Url) -> Result<ParsedRobots, FetchError> {
    let response = client
        .get(robots_url.as_str())
        .send()
        .await
        .map_err(|e| FetchError::Network {
            url: robots_url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!(
            "Access to {} refused (HTTP {}); treating the site as off limits",
            robots_url,
            status.as_u16()
        );
        return Ok(ParsedRobots::disallow_all());
    }
    if status.is_client_error() {
        tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status.as_u16());
        return Ok(ParsedRobots::allow_all());
    }

    if !status.is_success() {
        return Err(FetchError::Status {
            url: robots_url.to_string(),
            status_code: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| FetchError::Network {
        url: robots_url.to_string(),
        message: e.to_string(),
    })?;

    Ok(ParsedRobots::from_content(&body))
}
