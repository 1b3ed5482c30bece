//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`PageFetcher`] seam
//! - HTML parsing, content and link extraction
//! - URL admission (origin, robots.txt, blocked extensions)
//! - The FIFO frontier and the sequential crawl loop

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod policy;

pub use coordinator::{run_crawl, Crawler};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{Dequeued, Frontier};
pub use parser::{parse_page, ParsedPage};
pub use policy::{PolicyFilter, Rejection, RobotsStatus};
