//! Crawl statistics
//!
//! The crawl loop fills a [`CrawlReport`] as it goes; the CLI prints it once
//! the corpus has been written.

use crate::crawler::RobotsStatus;
use std::path::PathBuf;
use std::time::Duration;

/// Counters and outcome of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Seed URL after normalization
    pub start_url: String,

    /// Pages written to the corpus
    pub pages_stored: usize,

    /// URLs whose fetch failed (network, status, non-HTML)
    pub fetch_failures: usize,

    /// Queue entries dropped because the URL was already visited
    pub duplicates_skipped: usize,

    /// Discovered links rejected by the policy filter
    pub links_rejected: usize,

    /// Discovered links added to the queue
    pub links_enqueued: usize,

    /// Whether the loop stopped on the page budget rather than an empty queue
    pub budget_reached: bool,

    /// How robots.txt was handled
    pub robots_status: RobotsStatus,

    /// Wall-clock duration of the crawl loop
    pub elapsed: Duration,

    /// Where the corpus was written
    pub corpus_path: PathBuf,
}

impl CrawlReport {
    pub fn new(start_url: impl Into<String>, robots_status: RobotsStatus) -> Self {
        Self {
            start_url: start_url.into(),
            pages_stored: 0,
            fetch_failures: 0,
            duplicates_skipped: 0,
            links_rejected: 0,
            links_enqueued: 0,
            budget_reached: false,
            robots_status,
            elapsed: Duration::ZERO,
            corpus_path: PathBuf::new(),
        }
    }

    /// Fetch attempts made, successful or not
    pub fn attempts(&self) -> usize {
        self.pages_stored + self.fetch_failures
    }

    /// Share of fetch attempts that produced a page, in percent
    pub fn success_rate(&self) -> f64 {
        let attempts = self.attempts();
        if attempts > 0 {
            (self.pages_stored as f64 / attempts as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints the report to stdout
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Start URL: {}", report.start_url);
    println!("  Pages stored: {}", report.pages_stored);
    println!("  Fetch failures: {}", report.fetch_failures);
    println!("  Duration: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    println!("Frontier:");
    println!("  Links enqueued: {}", report.links_enqueued);
    println!("  Links rejected by policy: {}", report.links_rejected);
    println!("  Duplicate entries skipped: {}", report.duplicates_skipped);
    if report.budget_reached {
        println!("  Stopped at the page budget");
    }
    println!();

    match &report.robots_status {
        RobotsStatus::Loaded => println!("robots.txt: respected"),
        RobotsStatus::Disabled => println!("robots.txt: ignored (disabled)"),
        RobotsStatus::Unavailable(reason) => {
            println!("robots.txt: unavailable, all paths allowed ({})", reason)
        }
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} fetches stored)",
        report.success_rate(),
        report.pages_stored,
        report.attempts()
    );
    println!("Corpus saved to {}", report.corpus_path.display());
}
