use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::mock::MockProvider;
use crate::types::*;
use peditor_core::{GenerationError, ProviderConfig, Result};

/// Failure detail for an event stream that closed without `[DONE]` or a finish reason
const INCOMPLETE_STREAM: &str = "stream ended before completion";

/// Text generation backend
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Start a generation and return its fragment stream.
    ///
    /// Fails with `MissingCredential` before any network attempt when the request carries no
    /// credential. Transport and API failures arrive as the stream's final item.
    async fn stream_generate<'a>(
        &'a self, request: GenerationRequest, cancel_token: CancelToken,
    ) -> GenerationResult<FragmentStream<'a>>;

    /// Short backend name for logs and status output
    fn name(&self) -> &'static str;
}

/// Run a generation to completion and return the whole text.
pub async fn generate(
    provider: &dyn Provider, request: GenerationRequest, cancel_token: CancelToken,
) -> GenerationResult<String> {
    let mut stream = provider.stream_generate(request, cancel_token).await?;
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    client: HttpClient,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Self { client: HttpClient::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reasoning models reject a custom temperature
    fn supports_temperature(model: &str) -> bool {
        !(model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4"))
    }

    fn to_openai_request(request: &GenerationRequest) -> OpenAiChatRequest {
        OpenAiChatRequest {
            model: request.model.clone(),
            messages: vec![OpenAiMessage { role: "user".to_string(), content: request.prompt.clone() }],
            stream: true,
            temperature: Self::supports_temperature(&request.model).then_some(request.temperature),
        }
    }

    /// Parse one SSE data payload
    fn parse_chunk(chunk: &str) -> ChunkEvent {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return ChunkEvent::Skip;
        }
        if chunk.starts_with("[DONE]") {
            return ChunkEvent::Done;
        }

        match serde_json::from_str::<OpenAiChunk>(chunk) {
            Ok(data) => {
                if let Some(error) = data.error {
                    return ChunkEvent::Error(GenerationError::failed(error.message));
                }

                if let Some(choice) = data.choices.first() {
                    if let Some(content) = &choice.delta.content
                        && !content.is_empty()
                    {
                        return match choice.finish_reason {
                            Some(_) => ChunkEvent::Last(content.clone()),
                            None => ChunkEvent::Fragment(content.clone()),
                        };
                    }
                    if choice.finish_reason.is_some() {
                        return ChunkEvent::Done;
                    }
                }
                ChunkEvent::Skip
            }
            Err(_) => ChunkEvent::Error(GenerationError::failed(format!("Failed to parse chunk: {}", chunk))),
        }
    }
}

/// Outcome of parsing one SSE payload
#[derive(Debug, PartialEq)]
enum ChunkEvent {
    Fragment(String),
    /// Final fragment, carried in the chunk that also holds the finish reason
    Last(String),
    Skip,
    Done,
    Error(GenerationError),
}

/// What the next await produced while racing cancellation
enum Step<T> {
    Cancelled,
    Ready(T),
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn stream_generate<'a>(
        &'a self, request: GenerationRequest, cancel_token: CancelToken,
    ) -> GenerationResult<FragmentStream<'a>> {
        request.ensure_credential()?;

        let body = Self::to_openai_request(&request);
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %body.model, prompt_chars = request.prompt.chars().count(), "Starting chat completion");

        let stream = async_stream::stream! {
            let send = self.client
                .post(&url)
                .bearer_auth(request.credential.trim())
                .header("Content-Type", "application/json")
                .json(&body)
                .send();

            let step = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => Step::Cancelled,
                result = send => Step::Ready(result),
            };

            let response = match step {
                Step::Cancelled => {
                    yield Err(GenerationError::Cancelled);
                    return;
                }
                Step::Ready(Ok(resp)) => resp,
                Step::Ready(Err(e)) => {
                    warn!(error = %e, "Chat completion request failed");
                    yield Err(GenerationError::failed(format!("request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "Chat completion API error");
                yield Err(GenerationError::failed(format!("{} - {}", status, body.trim())));
                return;
            }

            let eventsource = response.bytes_stream().eventsource();
            tokio::pin!(eventsource);

            loop {
                let step = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => Step::Cancelled,
                    event = eventsource.next() => Step::Ready(event),
                };

                match step {
                    Step::Cancelled => {
                        yield Err(GenerationError::Cancelled);
                        return;
                    }
                    Step::Ready(None) => {
                        warn!("Event stream closed before the completion marker");
                        yield Err(GenerationError::failed(INCOMPLETE_STREAM));
                        return;
                    }
                    Step::Ready(Some(Ok(event))) => match Self::parse_chunk(&event.data) {
                        ChunkEvent::Fragment(text) => {
                            yield Ok(text);
                        }
                        ChunkEvent::Last(text) => {
                            yield Ok(text);
                            break;
                        }
                        ChunkEvent::Skip => {}
                        ChunkEvent::Done => break,
                        ChunkEvent::Error(e) => {
                            yield Err(e);
                            return;
                        }
                    },
                    Step::Ready(Some(Err(e))) => {
                        yield Err(GenerationError::failed(format!("SSE error: {}", e)));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

/// Streamed chunk
#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    delta: OpenAiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        match config {
            ProviderConfig::OpenAi { base_url } => Ok(Arc::new(OpenAiProvider::new(Some(base_url.clone())))),
            ProviderConfig::Mock { responses_file, fragment_delay_ms } => {
                let provider = match responses_file {
                    Some(path) => MockProvider::from_file(path)?,
                    None => MockProvider::demo(),
                };
                Ok(Arc::new(provider.with_fragment_delay(std::time::Duration::from_millis(*fragment_delay_ms))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| l.to_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let content_type = if status.starts_with("200") { "text/event-stream" } else { "application/json" };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn sse_chunks(fragments: &[&str]) -> String {
        let mut body = String::new();
        for fragment in fragments {
            let chunk = serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": fragment } }] });
            body.push_str(&format!("data: {}\n\n", chunk));
        }
        body
    }

    fn sse(fragments: &[&str]) -> String {
        let mut body = sse_chunks(fragments);
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn request(credential: &str) -> GenerationRequest {
        GenerationRequest::builder().prompt("Say hi").credential(credential).model("gpt-4o").temperature(0.5).build()
    }

    #[test]
    fn test_openai_provider_default_url() {
        let provider = OpenAiProvider::new(None);
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_openai_provider_trims_trailing_slash() {
        let provider = OpenAiProvider::new(Some("http://localhost:8080/v1/".to_string()));
        assert_eq!(provider.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_conversion() {
        let body = OpenAiProvider::to_openai_request(&request("k"));
        assert_eq!(body.model, "gpt-4o");
        assert!(body.stream);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.messages[0].content, "Say hi");
        assert_eq!(body.temperature, Some(0.5));
    }

    #[test]
    fn test_reasoning_models_omit_temperature() {
        let mut req = request("k");
        req.model = "o3-mini".to_string();
        let json = serde_json::to_string(&OpenAiProvider::to_openai_request(&req)).unwrap();
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_parse_chunk() {
        assert_eq!(OpenAiProvider::parse_chunk("[DONE]"), ChunkEvent::Done);
        assert_eq!(OpenAiProvider::parse_chunk("  "), ChunkEvent::Skip);
        assert_eq!(
            OpenAiProvider::parse_chunk(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#),
            ChunkEvent::Fragment("Hi".to_string())
        );
        assert_eq!(
            OpenAiProvider::parse_chunk(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            ChunkEvent::Skip
        );
        assert_eq!(
            OpenAiProvider::parse_chunk(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#),
            ChunkEvent::Done
        );
        assert_eq!(
            OpenAiProvider::parse_chunk(r#"{"error":{"message":"quota exceeded"}}"#),
            ChunkEvent::Error(GenerationError::failed("quota exceeded"))
        );
        assert!(matches!(OpenAiProvider::parse_chunk("{oops"), ChunkEvent::Error(_)));
        assert_eq!(
            OpenAiProvider::parse_chunk(r#"{"choices":[{"delta":{"content":"end"},"finish_reason":"stop"}]}"#),
            ChunkEvent::Last("end".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let provider = OpenAiProvider::new(Some("http://127.0.0.1:9".to_string()));
        let result = provider.stream_generate(request(""), CancelToken::new()).await;
        assert!(matches!(result, Err(GenerationError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_stream_fragments_in_order() {
        let (url, server) = serve_once("200 OK", sse(&["Sum", "mary."])).await;
        let provider = OpenAiProvider::new(Some(url));

        let stream = provider.stream_generate(request("sk-test"), CancelToken::new()).await.unwrap();
        let fragments: Vec<GenerationResult<String>> = stream.collect().await;
        assert_eq!(fragments, vec![Ok("Sum".to_string()), Ok("mary.".to_string())]);

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /chat/completions"));
        assert!(raw_request.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw_request.contains("\"stream\":true"));
    }

    #[tokio::test]
    async fn test_truncated_stream_fails() {
        let (url, _server) = serve_once("200 OK", sse_chunks(&["Sum", "ma"])).await;
        let provider = OpenAiProvider::new(Some(url));

        let stream = provider.stream_generate(request("sk-test"), CancelToken::new()).await.unwrap();
        let items: Vec<GenerationResult<String>> = stream.collect().await;
        assert_eq!(
            items,
            vec![Ok("Sum".to_string()), Ok("ma".to_string()), Err(GenerationError::failed(INCOMPLETE_STREAM))]
        );
    }

    #[tokio::test]
    async fn test_finish_reason_ends_stream_without_done() {
        let mut body = sse_chunks(&["Hi"]);
        let last = serde_json::json!({ "choices": [{ "index": 0, "delta": {}, "finish_reason": "stop" }] });
        body.push_str(&format!("data: {}\n\n", last));
        let (url, _server) = serve_once("200 OK", body).await;
        let provider = OpenAiProvider::new(Some(url));

        let text = generate(&provider, request("sk"), CancelToken::new()).await.unwrap();
        assert_eq!(text, "Hi");
    }

    #[tokio::test]
    async fn test_api_error_surfaces_as_failed() {
        let (url, _server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#.to_string()).await;
        let provider = OpenAiProvider::new(Some(url));

        let result = generate(&provider, request("sk-wrong"), CancelToken::new()).await;
        match result {
            Err(GenerationError::Failed(detail)) => {
                assert!(detail.contains("401"));
                assert!(detail.contains("bad key"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_collects_text() {
        let (url, _server) = serve_once("200 OK", sse(&["Hello", ", ", "world"])).await;
        let provider = OpenAiProvider::new(Some(url));
        let text = generate(&provider, request("sk"), CancelToken::new()).await.unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let provider = OpenAiProvider::new(Some("http://127.0.0.1:9".to_string()));
        let cancel = CancelToken::new();
        cancel.cancel();
        let stream = provider.stream_generate(request("sk"), cancel).await.unwrap();
        let items: Vec<GenerationResult<String>> = stream.collect().await;
        assert_eq!(items, vec![Err(GenerationError::Cancelled)]);
    }

    #[test]
    fn test_factory_openai() {
        let provider = ProviderFactory::create_from_config(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_factory_mock_missing_file() {
        let config = ProviderConfig::Mock {
            responses_file: Some("/definitely/not/here.toml".into()),
            fragment_delay_ms: 0,
        };
        assert!(ProviderFactory::create_from_config(&config).is_err());
    }

    #[test]
    fn test_factory_mock_demo() {
        let config = ProviderConfig::Mock { responses_file: None, fragment_delay_ms: 5 };
        let provider = ProviderFactory::create_from_config(&config).unwrap();
        assert_eq!(provider.name(), "mock");
    }
}
