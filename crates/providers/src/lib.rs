pub mod adapter;
pub mod mock;
pub mod types;

pub use adapter::{OpenAiProvider, Provider, ProviderFactory, generate};
pub use mock::{MockProvider, MockResponse};
pub use types::{CancelToken, FragmentStream, GenerationRequest, GenerationRequestBuilder, GenerationResult};

pub use peditor_core::{Error, GenerationError, Result};
