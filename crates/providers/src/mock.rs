use crate::Provider;
use crate::types::*;
use peditor_core::{Error, GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted responses for deterministic runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MockResponse {
    /// The whole text as one fragment
    Text { content: String },
    /// Fragments delivered in order
    Sequence { fragments: Vec<String> },
    /// Fails before any fragment
    Error { message: String },
    /// Delivers `fragments`, then fails with `message`
    FailAfter { fragments: Vec<String>, message: String },
    /// Delivers `fragments` and then never finishes
    Hang {
        #[serde(default)]
        fragments: Vec<String>,
    },
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text { content: content.into() }
    }

    pub fn sequence<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sequence { fragments: fragments.into_iter().map(Into::into).collect() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn fail_after<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FailAfter { fragments: fragments.into_iter().map(Into::into).collect(), message: message.into() }
    }

    pub fn hang<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Hang { fragments: fragments.into_iter().map(Into::into).collect() }
    }
}

/// Mock configuration from TOML file
#[derive(Debug, Deserialize)]
struct MockConfig {
    responses: Vec<MockResponse>,
}

/// Provider that replays scripted responses and records what it was asked
pub struct MockProvider {
    responses: Vec<MockResponse>,
    current: AtomicUsize,
    fragment_delay: Duration,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    /// Responses are handed out in order and wrap around once exhausted.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses,
            current: AtomicUsize::new(0),
            fragment_delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always answers with the given fragments
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![MockResponse::sequence(fragments)])
    }

    /// Canned reply used when no responses file is configured
    pub fn demo() -> Self {
        Self::new(vec![MockResponse::sequence([
            "This is a **mock** response. ",
            "Point `responses_file` at a TOML file ",
            "to script your own replies.",
        ])])
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read mock responses file {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MockConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse mock responses: {}", e)))?;
        if config.responses.is_empty() {
            return Err(Error::Config("mock responses file has no [[responses]] entries".to_string()));
        }
        Ok(Self::new(config.responses))
    }

    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn next_response(&self) -> MockResponse {
        if self.responses.is_empty() {
            return MockResponse::text("");
        }
        let index = self.current.fetch_add(1, Ordering::SeqCst);
        self.responses[index % self.responses.len()].clone()
    }

    fn record(&self, request: GenerationRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    async fn stream_generate<'a>(
        &'a self, request: GenerationRequest, cancel_token: CancelToken,
    ) -> GenerationResult<FragmentStream<'a>> {
        request.ensure_credential()?;
        self.record(request);

        let response = self.next_response();
        let delay = self.fragment_delay;

        let stream = async_stream::stream! {
            let (fragments, ending) = match response {
                MockResponse::Text { content } => (vec![content], Ending::Done),
                MockResponse::Sequence { fragments } => (fragments, Ending::Done),
                MockResponse::Error { message } => (Vec::new(), Ending::Fail(message)),
                MockResponse::FailAfter { fragments, message } => (fragments, Ending::Fail(message)),
                MockResponse::Hang { fragments } => (fragments, Ending::Hang),
            };

            for fragment in fragments {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if cancel_token.is_cancelled() {
                    yield Err(GenerationError::Cancelled);
                    return;
                }
                yield Ok(fragment);
            }

            match ending {
                Ending::Done => {}
                Ending::Fail(message) => {
                    yield Err(GenerationError::Failed(message));
                }
                Ending::Hang => {
                    cancel_token.cancelled().await;
                    yield Err(GenerationError::Cancelled);
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

enum Ending {
    Done,
    Fail(String),
    Hang,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use tokio_stream::StreamExt;

    fn request() -> GenerationRequest {
        GenerationRequest::builder().prompt("p").credential("sk-test").build()
    }

    #[test]
    fn test_mock_response_parsing() {
        let toml = r#"
[[responses]]
type = "text"
content = "Hello, world!"

[[responses]]
type = "sequence"
fragments = ["Sum", "mary."]

[[responses]]
type = "error"
message = "rate limited"

[[responses]]
type = "fail_after"
fragments = ["partial "]
message = "connection reset"

[[responses]]
type = "hang"
"#;

        let provider = MockProvider::from_toml_str(toml).unwrap();
        assert_eq!(provider.responses.len(), 5);
        assert_eq!(provider.responses[0], MockResponse::text("Hello, world!"));
        assert_eq!(provider.responses[1], MockResponse::sequence(["Sum", "mary."]));
        assert_eq!(provider.responses[2], MockResponse::error("rate limited"));
        assert_eq!(provider.responses[3], MockResponse::fail_after(["partial "], "connection reset"));
        assert_eq!(provider.responses[4], MockResponse::Hang { fragments: Vec::new() });
    }

    #[test]
    fn test_empty_responses_rejected() {
        assert!(MockProvider::from_toml_str("responses = []").is_err());
    }

    #[test]
    fn test_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("responses.toml");
        fs::write(&path, "[[responses]]\ntype = \"text\"\ncontent = \"ok\"\n").unwrap();
        let provider = MockProvider::from_file(&path).unwrap();
        assert_eq!(provider.responses, vec![MockResponse::text("ok")]);
    }

    #[tokio::test]
    async fn test_sequence_fragments_in_order() {
        let provider = MockProvider::with_fragments(["f1", "f2", "f3"]);
        let stream = provider.stream_generate(request(), CancelToken::new()).await.unwrap();
        let items: Vec<GenerationResult<String>> = stream.collect().await;
        assert_eq!(items, vec![Ok("f1".to_string()), Ok("f2".to_string()), Ok("f3".to_string())]);
    }

    #[tokio::test]
    async fn test_fail_after_keeps_earlier_fragments() {
        let provider = MockProvider::new(vec![MockResponse::fail_after(["partial "], "boom")]);
        let stream = provider.stream_generate(request(), CancelToken::new()).await.unwrap();
        let items: Vec<GenerationResult<String>> = stream.collect().await;
        assert_eq!(items, vec![Ok("partial ".to_string()), Err(GenerationError::failed("boom"))]);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let provider = MockProvider::demo();
        let request = GenerationRequest::builder().prompt("p").build();
        let result = provider.stream_generate(request, CancelToken::new()).await;
        assert!(matches!(result, Err(GenerationError::MissingCredential)));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_records_requests_and_wraps_around() {
        let provider = MockProvider::new(vec![MockResponse::text("a"), MockResponse::text("b")]);
        let mut texts = Vec::new();
        for _ in 0..3 {
            texts.push(generate(&provider, request(), CancelToken::new()).await.unwrap());
        }
        assert_eq!(texts, vec!["a", "b", "a"]);
        assert_eq!(provider.request_count(), 3);
        assert_eq!(provider.requests()[0].prompt, "p");
    }

    #[tokio::test]
    async fn test_hang_ends_on_cancel() {
        let provider = MockProvider::new(vec![MockResponse::hang(["first"])]);
        let cancel = CancelToken::new();
        let mut stream = provider.stream_generate(request(), cancel.clone()).await.unwrap();

        assert_eq!(stream.next().await, Some(Ok("first".to_string())));
        cancel.cancel();
        assert_eq!(stream.next().await, Some(Err(GenerationError::Cancelled)));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_fragment_delay() {
        let provider = MockProvider::with_fragments(["a", "b"]).with_fragment_delay(Duration::from_millis(10));
        let started = tokio::time::Instant::now();
        let text = generate(&provider, request(), CancelToken::new()).await.unwrap();
        assert_eq!(text, "ab");
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
