//! Deterministic completion provider

use crate::llm::{CompletionError, CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

type Scripted = Result<String, String>;

#[derive(Debug, Default)]
struct MockState {
    /// Consulted first: the first rule whose needle occurs in the prompt answers
    rules: Vec<(String, Scripted)>,
    /// Consumed in order when no rule matches
    queue: VecDeque<Scripted>,
    requests: Vec<CompletionRequest>,
}

/// Mock provider for deterministic testing
///
/// Clones share state, so a test can keep a handle while the analyzer owns
/// another.
///
/// # Examples
///
/// ```
/// use site_digest::llm::{CompletionProvider, CompletionRequest, MockProvider};
///
/// # tokio_test_block(async {
/// let provider = MockProvider::new("fallback");
/// provider.push_response("first");
/// provider.fail_when("merge", "boom");
///
/// let request = |prompt: &str| CompletionRequest {
///     model: "gpt-4o-mini".into(),
///     system: String::new(),
///     prompt: prompt.into(),
///     temperature: 0.2,
/// };
///
/// assert_eq!(provider.complete(&request("a")).await.unwrap(), "first");
/// assert_eq!(provider.complete(&request("b")).await.unwrap(), "fallback");
/// assert!(provider.complete(&request("please merge")).await.is_err());
/// assert_eq!(provider.call_count(), 3);
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Creates a provider answering every prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Queues a response for the next unmatched call
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().queue.push_back(Ok(response.into()));
    }

    /// Queues a failure for the next unmatched call
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state().queue.push_back(Err(message.into()));
    }

    /// Answers with `response` whenever the prompt contains `needle`
    pub fn respond_when(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((needle.into(), Ok(response.into())));
    }

    /// Fails whenever the prompt contains `needle`
    pub fn fail_when(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.state().rules.push((needle.into(), Err(message.into())));
    }

    /// Every request received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let mut state = self.state();
        state.requests.push(request.clone());

        let matched = state
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, scripted)| scripted.clone());

        let scripted = matched
            .or_else(|| state.queue.pop_front())
            .unwrap_or_else(|| Ok(self.default_response.clone()));

        scripted.map_err(CompletionError::Other)
    }
}
