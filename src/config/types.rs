use serde::Deserialize;

/// Main configuration structure for Site-Digest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URL; its origin bounds the crawl
    #[serde(rename = "start-url", default)]
    pub start_url: Option<String>,

    /// Maximum number of pages stored in the corpus
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Pause before every request (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Whether robots.txt rules are consulted
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Path suffixes that are never enqueued
    #[serde(rename = "blocked-extensions", default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_pages: default_max_pages(),
            delay_ms: default_delay_ms(),
            respect_robots: true,
            blocked_extensions: default_blocked_extensions(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteDigest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/site-digest".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the HTTP user agent: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the corpus and analysis files
    #[serde(default = "default_output_dir")]
    pub directory: String,

    /// File name of the persisted corpus
    #[serde(rename = "corpus-file", default = "default_corpus_file")]
    pub corpus_file: String,

    /// File stem of the persisted analysis (`.json` and `.md` are appended)
    #[serde(rename = "analysis-file", default = "default_analysis_file")]
    pub analysis_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            corpus_file: default_corpus_file(),
            analysis_file: default_analysis_file(),
        }
    }
}

/// Analysis (segmentation and text-completion) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Model identifier passed to the completion backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Strip metadata and images and hoist containers before flattening
    #[serde(rename = "optimize-input", default = "default_true")]
    pub optimize_input: bool,

    /// Tokens held back for prompt scaffolding in every segment
    #[serde(rename = "reserved-tokens", default = "default_reserved_tokens")]
    pub reserved_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Base URL of the OpenAI-compatible API
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Overrides the per-model context limit
    #[serde(rename = "max-context-tokens", default)]
    pub max_context_tokens: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            optimize_input: true,
            reserved_tokens: default_reserved_tokens(),
            temperature: default_temperature(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            max_context_tokens: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> usize {
    1000
}

fn default_delay_ms() -> u64 {
    500
}

fn default_blocked_extensions() -> Vec<String> {
    [
        ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".zip", ".gz", ".tar", ".rar",
        ".exe", ".dmg", ".mp3", ".mp4",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_output_dir() -> String {
    "scraped_data".to_string()
}

fn default_corpus_file() -> String {
    "scraped_data.json".to_string()
}

fn default_analysis_file() -> String {
    "content_analysis".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reserved_tokens() -> usize {
    4000
}

fn default_temperature() -> f32 {
    0.2
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
