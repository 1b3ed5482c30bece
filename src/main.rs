//! Site-Digest main entry point
//!
//! Command-line interface: `crawl` builds a corpus from one site, `analyze`
//! condenses an existing corpus through the completion backend.

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use site_digest::analysis::run_analysis;
use site_digest::config::{load_config_with_hash, validate, Config};
use site_digest::crawler::run_crawl;
use site_digest::llm::OpenAiProvider;
use site_digest::output::print_crawl_report;
use site_digest::storage::{CorpusStore, JsonStorage};
use site_digest::{AnalysisOutcome, Corpus};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Digest: crawl one website and digest its content
///
/// The crawler stays on the start URL's origin, honors robots.txt and a
/// politeness delay, and stores the structured content of every page as JSON.
/// The analyzer turns that corpus into a single summary, splitting it into
/// token-budgeted segments when it is too large for one request.
#[derive(Parser, Debug)]
#[command(name = "site-digest")]
#[command(version)]
#[command(about = "Crawl a website and digest its content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site into a JSON corpus
    Crawl(CrawlArgs),
    /// Analyze a previously crawled corpus
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed URL; falls back to `crawler.start-url` from the config
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Directory for the corpus and analysis files
    #[arg(long)]
    output_dir: Option<String>,

    /// Maximum number of pages to store
    #[arg(long)]
    max_pages: Option<usize>,

    /// Minimum delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Ignore robots.txt
    #[arg(long)]
    no_robots: bool,

    /// Analyze the corpus once the crawl finishes
    #[arg(long)]
    analyze: bool,

    /// Model used with --analyze
    #[arg(long, requires = "analyze")]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Corpus file; defaults to the configured corpus in the output directory
    #[arg(long, value_name = "PATH", conflicts_with = "corpus_json")]
    data: Option<PathBuf>,

    /// Inline corpus as a JSON string
    #[arg(long, value_name = "JSON")]
    corpus_json: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Keep metadata, images and containers in the prompt
    #[arg(long)]
    no_optimize: bool,

    /// Directory for the analysis files
    #[arg(long)]
    output_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_ref())?;

    match cli.command {
        Command::Crawl(args) => handle_crawl(config, args).await,
        Command::Analyze(args) => handle_analyze(config, args).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_digest=info,warn"),
            1 => EnvFilter::new("site_digest=debug,info"),
            2 => EnvFilter::new("site_digest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given; using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

async fn handle_crawl(mut config: Config, args: CrawlArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if let Some(max_pages) = args.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.crawler.delay_ms = delay_ms;
    }
    if args.no_robots {
        config.crawler.respect_robots = false;
    }
    if let Some(model) = args.model {
        config.analysis.model = model;
    }
    validate(&config).context("Invalid command-line overrides")?;

    let start_url = args
        .start_url
        .or_else(|| config.crawler.start_url.clone())
        .ok_or_else(|| anyhow!("No start URL given on the command line or in the config"))?;

    // Fail before crawling rather than after
    if args.analyze {
        OpenAiProvider::from_config(&config.analysis)
            .context("--analyze needs an API key for the completion backend")?;
    }

    tracing::info!(
        "Crawling {} (max {} pages, {}ms delay, robots.txt {})",
        start_url,
        config.crawler.max_pages,
        config.crawler.delay_ms,
        if config.crawler.respect_robots { "on" } else { "off" }
    );

    let (corpus, report) = run_crawl(&config, &start_url)
        .await
        .context("Crawl failed")?;
    print_crawl_report(&report);

    if args.analyze {
        analyze_corpus(&config, &corpus).await?;
    }

    Ok(())
}

async fn handle_analyze(mut config: Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if let Some(model) = args.model {
        config.analysis.model = model;
    }
    if args.no_optimize {
        config.analysis.optimize_input = false;
    }
    validate(&config).context("Invalid command-line overrides")?;

    let corpus = match args.corpus_json {
        Some(raw) => {
            Corpus::from_json_str(&raw).context("Failed to parse the inline corpus JSON")?
        }
        None => {
            let path = args.data.unwrap_or_else(|| {
                PathBuf::from(&config.output.directory).join(&config.output.corpus_file)
            });
            JsonStorage::new(&path)
                .load()
                .with_context(|| format!("Failed to load corpus from {}", path.display()))?
        }
    };
    tracing::info!("Analyzing {} pages", corpus.len());

    analyze_corpus(&config, &corpus).await
}

async fn analyze_corpus(config: &Config, corpus: &Corpus) -> anyhow::Result<()> {
    let (outcome, files) = run_analysis(config, corpus)
        .await
        .context("Analysis failed")?;

    println!("Analysis saved to {}", files.json.display());
    if let Some(md) = &files.markdown {
        println!("Summary saved to {}", md.display());
    }

    match outcome {
        AnalysisOutcome::Completed(analysis) => {
            if let Some(parts) = analysis.parts_count {
                println!("Merged {} partial analyses", parts);
            }
            if let Some(error) = analysis.unification_error {
                println!("Merge step failed ({}); parts were concatenated", error);
            }
            Ok(())
        }
        AnalysisOutcome::Failed { error } => Err(anyhow!("Analysis request failed: {}", error)),
    }
}
