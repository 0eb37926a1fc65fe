pub mod config;
pub mod error;
pub mod history;
pub mod kv;
pub mod logging;
pub mod notice;
pub mod settings;
pub mod template;

pub use config::{Config, GenerationConfig, LoggingConfig, ProviderConfig, StoreConfig};
pub use error::{Error, GenerationError, Result};
pub use history::{Direction, Histories, History, HistoryKind, HistoryStore, MoveOutcome};
pub use kv::{KeyValueStore, MemoryKeyValueStore, SharedStore};
pub use notice::{Notice, NoticeLevel};
pub use settings::{MODELS, ModelInfo, Settings, SettingsContext, format_temperature};
pub use template::{OUTPUT_ONLY_SUFFIX, Template, TemplateOption, build_prompt, templates};
