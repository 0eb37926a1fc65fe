use std::pin::Pin;

use futures::stream::Stream;
use peditor_core::GenerationError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Result of generation-level operations
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Lazily produced text fragments. Ends after the model finishes, or after a single `Err`.
pub type FragmentStream<'a> = Pin<Box<dyn Stream<Item = GenerationResult<String>> + Send + 'a>>;

/// One generation call: prompt, credential, model and temperature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing)]
    pub credential: String,
    pub model: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    /// Fail with `MissingCredential` unless a non-blank credential is set
    pub fn ensure_credential(&self) -> GenerationResult<()> {
        if self.has_credential() { Ok(()) } else { Err(GenerationError::MissingCredential) }
    }
}

pub struct GenerationRequestBuilder {
    prompt: String,
    credential: String,
    model: String,
    temperature: f32,
}

impl Default for GenerationRequestBuilder {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            credential: String::new(),
            model: peditor_core::config::DEFAULT_MODEL.to_string(),
            temperature: peditor_core::config::DEFAULT_TEMPERATURE,
        }
    }
}

impl GenerationRequestBuilder {
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt,
            credential: self.credential,
            model: self.model,
            temperature: self.temperature,
        }
    }
}

/// Cooperative cancellation shared between a caller and the stream it started
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Resolves once `cancel` has been called on this token or any clone
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::builder()
            .prompt("Summarize this")
            .credential("sk-abc")
            .model("o1")
            .temperature(0.4)
            .build();

        assert_eq!(request.prompt, "Summarize this");
        assert_eq!(request.model, "o1");
        assert!((request.temperature - 0.4).abs() < f32::EPSILON);
        assert!(request.has_credential());
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = GenerationRequest::builder().build();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, 0.7);
        assert!(!request.has_credential());
    }

    #[test]
    fn test_temperature_clamped() {
        assert_eq!(GenerationRequest::builder().temperature(3.0).build().temperature, 1.0);
        assert_eq!(GenerationRequest::builder().temperature(-1.0).build().temperature, 0.0);
    }

    #[test]
    fn test_ensure_credential() {
        let request = GenerationRequest::builder().credential("  ").build();
        assert_eq!(request.ensure_credential(), Err(GenerationError::MissingCredential));

        let request = GenerationRequest::builder().credential("key").build();
        assert!(request.ensure_credential().is_ok());
    }

    #[test]
    fn test_credential_not_serialized() {
        let request = GenerationRequest::builder().credential("sk-secret").prompt("p").build();
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_cancel_token() {
        let cancel = CancelToken::new();
        assert!(!cancel.is_cancelled());

        let clone = cancel.clone();
        let waiter = tokio::spawn(async move { clone.cancelled().await });
        cancel.cancel();
        waiter.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
