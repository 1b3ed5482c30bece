//! Crawler coordinator - main crawl orchestration logic
//!
//! The loop is strictly sequential: one URL is dequeued, the politeness
//! delay elapses, the page is fetched and parsed, and discovered links are
//! filtered and enqueued before the next URL is considered. The corpus is
//! persisted once, after the loop ends.

use crate::config::Config;
use crate::content::PageRecord;
use crate::crawler::frontier::{Dequeued, Frontier};
use crate::crawler::parser::parse_page;
use crate::crawler::policy::PolicyFilter;
use crate::crawler::{build_http_client, HttpFetcher, PageFetcher};
use crate::output::CrawlReport;
use crate::robots::{HttpRobotsSource, RobotsSource};
use crate::storage::{Corpus, CorpusStore, JsonStorage};
use crate::url::{normalize_url, origin_of};
use crate::{ConfigError, DigestError};
use chrono::Utc;
use std::time::{Duration, Instant};
use url::Url;

/// Main crawler structure
pub struct Crawler {
    fetcher: Box<dyn PageFetcher>,
    policy: PolicyFilter,
    store: Box<dyn CorpusStore>,
    frontier: Frontier,
    corpus: Corpus,
    report: CrawlReport,
    max_pages: usize,
    delay: Duration,
}

impl Crawler {
    /// Creates a crawler seeded with `seed_url`
    ///
    /// The seed is normalized and queued without passing through the policy
    /// filter. The delay used is the larger of `delay_ms` and any
    /// robots.txt `Crawl-delay` for our agent.
    pub fn new(
        seed_url: &str,
        fetcher: Box<dyn PageFetcher>,
        policy: PolicyFilter,
        store: Box<dyn CorpusStore>,
        max_pages: usize,
        delay_ms: u64,
    ) -> Self {
        let seed = normalize_url(seed_url, seed_url);

        let mut delay = Duration::from_millis(delay_ms);
        if let Some(robots_delay) = policy.crawl_delay() {
            if robots_delay > delay {
                tracing::info!(
                    "robots.txt requests a crawl delay of {:?}; using it instead of {:?}",
                    robots_delay,
                    delay
                );
                delay = robots_delay;
            }
        }

        let report = CrawlReport::new(seed.clone(), policy.robots_status().clone());

        Self {
            fetcher,
            policy,
            store,
            frontier: Frontier::with_seed(seed),
            corpus: Corpus::new(),
            report,
            max_pages,
            delay,
        }
    }

    /// Runs the crawl loop to completion and persists the corpus
    ///
    /// Per-URL failures are logged and skipped; only a failure to write the
    /// corpus aborts the run.
    pub async fn run(mut self) -> Result<(Corpus, CrawlReport), DigestError> {
        tracing::info!(
            "Starting crawl of {} (budget {} pages, delay {:?})",
            self.report.start_url,
            self.max_pages,
            self.delay
        );
        let start_time = Instant::now();

        while self.corpus.len() < self.max_pages {
            let url = match self.frontier.dequeue() {
                Some(Dequeued::Fresh(url)) => url,
                Some(Dequeued::Duplicate(url)) => {
                    tracing::debug!("Already visited {}, skipping", url);
                    self.report.duplicates_skipped += 1;
                    continue;
                }
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
            };

            tokio::time::sleep(self.delay).await;
            let stored = self.process_url(&url).await;

            if stored && self.corpus.len() % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages stored, {} in queue",
                    self.corpus.len(),
                    self.frontier.queued()
                );
            }
        }

        if self.corpus.len() >= self.max_pages && !self.frontier.is_empty() {
            tracing::info!("Page budget of {} reached", self.max_pages);
            self.report.budget_reached = true;
        }

        self.report.pages_stored = self.corpus.len();
        self.report.elapsed = start_time.elapsed();
        self.report.corpus_path = self.store.save(&self.corpus)?;

        tracing::info!(
            "Crawl completed: {} pages stored in {:?}",
            self.report.pages_stored,
            self.report.elapsed
        );

        Ok((self.corpus, self.report))
    }

    /// Fetches one URL, stores its record and enqueues admitted links
    ///
    /// Returns true when a page was added to the corpus.
    async fn process_url(&mut self, url: &str) -> bool {
        tracing::debug!("Fetching {}", url);

        let fetched = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Error processing {}: {}", url, e);
                self.report.fetch_failures += 1;
                return false;
            }
        };

        // Links are resolved against where the server actually sent us
        let parsed = parse_page(&fetched.body, &fetched.final_url);

        let id = self.corpus.insert(PageRecord {
            url: url.to_string(),
            title: parsed.title,
            metadata: parsed.metadata,
            content: parsed.content,
            fetched_at: Utc::now(),
        });
        tracing::info!("Stored {} as page {}", url, id);

        self.handle_discovered_links(&parsed.links);
        true
    }

    fn handle_discovered_links(&mut self, links: &[String]) {
        for link in links {
            match self.policy.check(link) {
                Ok(()) => {
                    if self.frontier.enqueue(link.as_str()) {
                        self.report.links_enqueued += 1;
                    }
                }
                Err(rejection) => {
                    tracing::debug!("Skipping {}: {}", link, rejection);
                    self.report.links_rejected += 1;
                }
            }
        }
    }
}

/// Runs a complete crawl from `start_url` with the HTTP-backed collaborators
///
/// 1. Validate the seed and derive its origin
/// 2. Build the HTTP client
/// 3. Load robots.txt once (unless disabled)
/// 4. Crawl breadth-first until the queue empties or the budget is hit
/// 5. Write `<output.directory>/<output.corpus-file>`
///
/// # Example
///
/// ```no_run
/// use site_digest::config::Config;
/// use site_digest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (corpus, report) = run_crawl(&Config::default(), "https://example.com").await?;
/// println!("{} pages, {} failures", corpus.len(), report.fetch_failures);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    start_url: &str,
) -> Result<(Corpus, CrawlReport), DigestError> {
    crate::config::validate_start_url(start_url)?;

    let seed = Url::parse(start_url)?;
    let origin = origin_of(&seed)
        .ok_or_else(|| ConfigError::InvalidUrl(format!("Start URL '{}' has no origin", start_url)))?;

    let client = build_http_client(&config.user_agent)?;

    let robots_source = config
        .crawler
        .respect_robots
        .then(|| HttpRobotsSource::new(client.clone()));

    let policy = PolicyFilter::load(
        origin,
        robots_source.as_ref().map(|s| s as &dyn RobotsSource),
        &config.user_agent.crawler_name,
        &config.crawler.blocked_extensions,
    )
    .await;

    let store = JsonStorage::in_directory(&config.output.directory, &config.output.corpus_file);

    Crawler::new(
        start_url,
        Box::new(HttpFetcher::new(client)),
        policy,
        Box::new(store),
        config.crawler.max_pages,
        config.crawler.delay_ms,
    )
    .run()
    .await
}
