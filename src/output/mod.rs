//! Output module for crawl reports and analysis files
//!
//! This module handles:
//! - Printing crawl statistics
//! - Writing the analysis as JSON and markdown

mod analysis;
pub mod stats;

pub use analysis::{write_analysis, AnalysisFiles};
pub use stats::{print_crawl_report, CrawlReport};
