//! Integration tests for the analysis pipeline
//!
//! The OpenAI-compatible backend is served by wiremock; multi-segment runs
//! use the scripted `MockProvider`.

use reqwest::Client;
use serde_json::json;
use site_digest::analysis::{run_analysis, Analyzer, AnalysisError, HeuristicEstimator};
use site_digest::config::{AnalysisConfig, Config, OutputConfig};
use site_digest::llm::{MockProvider, OpenAiProvider};
use site_digest::storage::{CorpusStore, JsonStorage};
use site_digest::{AnalysisOutcome, ConfigError, ContentNode, Corpus, PageRecord};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(i: usize, paragraphs: Vec<String>) -> PageRecord {
    let mut content = vec![ContentNode::heading(1, format!("Section {}", i))];
    content.extend(paragraphs.into_iter().map(ContentNode::paragraph));
    PageRecord {
        url: format!("https://shop.example.com/{}", i),
        title: format!("Page {}", i),
        metadata: BTreeMap::new(),
        content,
        fetched_at: chrono::Utc::now(),
    }
}

fn small_corpus() -> Corpus {
    vec![page(0, vec!["Handmade ceramic mugs.".to_string()])]
        .into_iter()
        .collect()
}

fn large_corpus() -> Corpus {
    (0..6)
        .map(|i| page(i, vec![format!("product{} details ", i).repeat(40)]))
        .collect()
}

fn test_config(dir: &TempDir, max_context_tokens: Option<usize>) -> Config {
    Config {
        output: OutputConfig {
            directory: dir.path().join("out").to_string_lossy().into_owned(),
            ..OutputConfig::default()
        },
        analysis: AnalysisConfig {
            model: "gpt-4o-mini".to_string(),
            reserved_tokens: 0,
            max_context_tokens,
            ..AnalysisConfig::default()
        },
        ..Config::default()
    }
}

fn chat_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    }))
}

#[tokio::test]
async fn test_openai_backend_single_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, None);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(chat_response("A shop selling ceramic mugs."))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(Client::new(), server.uri(), "test-key");
    let analyzer = Analyzer::new(Box::new(provider), Box::new(HeuristicEstimator), &config.analysis);

    let (outcome, files) = analyzer
        .analyze_and_save(&small_corpus(), &config.output)
        .await
        .unwrap();

    assert_eq!(outcome.summary(), Some("A shop selling ceramic mugs."));
    let md = fs::read_to_string(files.markdown.unwrap()).unwrap();
    assert_eq!(md, "A shop selling ceramic mugs.");

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
    assert_eq!(saved["model_used"], "gpt-4o-mini");
    assert!(saved.get("parts").is_none());
}

#[tokio::test]
async fn test_rate_limited_request_records_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, None);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(Client::new(), server.uri(), "test-key");
    let analyzer = Analyzer::new(Box::new(provider), Box::new(HeuristicEstimator), &config.analysis);

    let (outcome, files) = analyzer
        .analyze_and_save(&small_corpus(), &config.output)
        .await
        .unwrap();

    assert!(!outcome.is_completed());
    assert!(files.markdown.is_none());
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
    assert_eq!(saved, json!({"error": "Rate limit exceeded"}));
}

#[tokio::test]
async fn test_large_corpus_is_merged_from_parts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, Some(450));

    let provider = MockProvider::new("partial analysis");
    provider.respond_when("PARTIAL ANALYSES TO MERGE", "Unified shop overview");

    let analyzer = Analyzer::new(
        Box::new(provider.clone()),
        Box::new(HeuristicEstimator),
        &config.analysis,
    );
    let (outcome, files) = analyzer
        .analyze_and_save(&large_corpus(), &config.output)
        .await
        .unwrap();

    let analysis = match outcome {
        AnalysisOutcome::Completed(analysis) => analysis,
        other => panic!("expected a completed analysis, got {:?}", other),
    };
    let parts = analysis.parts_count.unwrap();
    assert!(parts > 1);
    assert_eq!(analysis.summary, "Unified shop overview");

    // One call per part plus the merge
    let requests = provider.requests();
    assert_eq!(requests.len(), parts + 1);

    // Each page lands in exactly one segment call
    for i in 0..6 {
        let needle = format!("product{} details", i);
        let hits = requests[..parts]
            .iter()
            .filter(|r| r.prompt.contains(&needle))
            .count();
        assert_eq!(hits, 1, "page {} should be analyzed once", i);
    }

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
    assert_eq!(saved["parts_count"], parts);
    assert_eq!(saved["parts"].as_array().unwrap().len(), parts);
}

#[tokio::test]
async fn test_merge_failure_still_writes_analysis() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, Some(450));

    let provider = MockProvider::new("partial analysis");
    provider.fail_when("PARTIAL ANALYSES TO MERGE", "context length exceeded");

    let analyzer = Analyzer::new(Box::new(provider), Box::new(HeuristicEstimator), &config.analysis);
    let (outcome, files) = analyzer
        .analyze_and_save(&large_corpus(), &config.output)
        .await
        .unwrap();

    let summary = outcome.summary().unwrap();
    assert!(summary.starts_with("# Part 1\n\npartial analysis"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
    assert_eq!(saved["unification_error"], "context length exceeded");
    assert!(files.markdown.is_some());
}

#[tokio::test]
async fn test_saved_corpus_feeds_analysis() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, None);

    let store = JsonStorage::in_directory(&config.output.directory, &config.output.corpus_file);
    let path = store.save(&small_corpus()).unwrap();

    let corpus = JsonStorage::new(path).load().unwrap();
    let provider = MockProvider::new("Summary from disk");
    let analyzer = Analyzer::new(
        Box::new(provider.clone()),
        Box::new(HeuristicEstimator),
        &config.analysis,
    );
    let outcome = analyzer.analyze(&corpus).await.unwrap();

    assert_eq!(outcome.summary(), Some("Summary from disk"));
    assert!(provider.requests()[0].prompt.contains("Handmade ceramic mugs."));
}

#[tokio::test]
async fn test_missing_api_key_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, None);
    config.analysis.api_key_env = "SITE_DIGEST_TEST_KEY_THAT_IS_NEVER_SET".to_string();

    let result = run_analysis(&config, &small_corpus()).await;

    assert!(matches!(
        result,
        Err(AnalysisError::Config(ConfigError::MissingCredential(ref var)))
            if var == "SITE_DIGEST_TEST_KEY_THAT_IS_NEVER_SET"
    ));
    assert!(!dir.path().join("out").exists());
}
