//! Admission policy for discovered URLs
//!
//! Rules are applied in order and the first failure wins:
//! 1. Same origin (scheme, host and port) as the crawl seed
//! 2. Allowed by robots.txt for the crawler's product token
//! 3. Path does not end with a blocked extension

use crate::robots::{ParsedRobots, RobotsSource};
use crate::url::same_origin;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Outcome of loading the exclusion rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsStatus {
    /// Rules were loaded (possibly empty)
    Loaded,
    /// Loading failed; every URL is treated as allowed
    Unavailable(String),
    /// Robots handling was switched off in the configuration
    Disabled,
}

/// Why a URL was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ForeignOrigin,
    RobotsDisallowed,
    BlockedExtension(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ForeignOrigin => write!(f, "different origin"),
            Rejection::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
            Rejection::BlockedExtension(ext) => write!(f, "blocked extension {}", ext),
        }
    }
}

/// Decides whether a normalized URL may be enqueued
#[derive(Debug, Clone)]
pub struct PolicyFilter {
    origin: Url,
    robots: ParsedRobots,
    robots_status: RobotsStatus,
    robots_agent: String,
    blocked_extensions: Vec<String>,
}

impl PolicyFilter {
    /// Creates a filter from already-loaded rules
    pub fn new(
        origin: Url,
        robots: ParsedRobots,
        robots_agent: impl Into<String>,
        blocked_extensions: &[String],
    ) -> Self {
        Self {
            origin,
            robots,
            robots_status: RobotsStatus::Loaded,
            robots_agent: robots_agent.into(),
            blocked_extensions: blocked_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Loads robots.txt through `source` and builds the filter
    ///
    /// Passing `None` disables robots handling. A load failure is not fatal:
    /// it is logged and the filter allows everything rule 2 would check.
    pub async fn load(
        origin: Url,
        source: Option<&dyn RobotsSource>,
        robots_agent: &str,
        blocked_extensions: &[String],
    ) -> Self {
        let Some(source) = source else {
            let mut filter = Self::new(
                origin,
                ParsedRobots::allow_all(),
                robots_agent,
                blocked_extensions,
            );
            filter.robots_status = RobotsStatus::Disabled;
            return filter;
        };

        match source.load(&origin).await {
            Ok(robots) => {
                tracing::info!("Loaded robots.txt for {}", origin);
                Self::new(origin, robots, robots_agent, blocked_extensions)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load robots.txt for {}: {}; allowing all paths",
                    origin,
                    e
                );
                let mut filter = Self::new(
                    origin,
                    ParsedRobots::allow_all(),
                    robots_agent,
                    blocked_extensions,
                );
                filter.robots_status = RobotsStatus::Unavailable(e.to_string());
                filter
            }
        }
    }

    /// Checks a normalized URL against all rules
    pub fn check(&self, url: &str) -> Result<(), Rejection> {
        if !same_origin(url, &self.origin) {
            return Err(Rejection::ForeignOrigin);
        }

        if !self.robots.is_allowed(url, &self.robots_agent) {
            return Err(Rejection::RobotsDisallowed);
        }

        if let Some(ext) = self.blocked_extension(url) {
            return Err(Rejection::BlockedExtension(ext.to_string()));
        }

        Ok(())
    }

    pub fn robots_status(&self) -> &RobotsStatus {
        &self.robots_status
    }

    /// Crawl-delay requested by robots.txt for our agent, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots
            .crawl_delay(&self.robots_agent)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    fn blocked_extension(&self, url: &str) -> Option<&str> {
        let path = Url::parse(url).ok()?.path().to_ascii_lowercase();
        self.blocked_extensions
            .iter()
            .find(|ext| path.ends_with(ext.as_str()))
            .map(String::as_str)
    }
}
