//! User settings: credential, model and temperature, plus per-template option choices.
//!
//! [`SettingsContext`] is an explicit object handed to whatever needs settings. It reads and
//! writes through an injected [`KeyValueStore`](crate::kv::KeyValueStore) and publishes the
//! current values on a watch channel.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationConfig};
use crate::error::{Error, Result};
use crate::kv::{self, MemoryKeyValueStore, SharedStore, keys};
use crate::logging::mask_credential;
use crate::template::Template;

/// A model the settings dialog offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub label: &'static str,
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gpt-4o", label: "GPT-4o" },
    ModelInfo { id: "gpt-4o-mini", label: "GPT-4o-mini" },
    ModelInfo { id: "o1-mini", label: "o1-mini" },
    ModelInfo { id: "o1", label: "o1" },
    ModelInfo { id: "o3-mini", label: "o3-mini" },
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

/// Temperature for display: two decimals at most, one at least
pub fn format_temperature(value: f32) -> String {
    let mut text = format!("{value:.2}");
    if text.ends_with('0') {
        text.pop();
    }
    text
}

/// Current settings values
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub credential: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self { credential: String::new(), model: DEFAULT_MODEL.to_string(), temperature: DEFAULT_TEMPERATURE }
    }
}

impl Settings {
    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    /// Display label for the model, falling back to the raw id
    pub fn model_label(&self) -> &str {
        find_model(&self.model).map(|m| m.label).unwrap_or(&self.model)
    }

    pub fn masked_credential(&self) -> String {
        mask_credential(&self.credential)
    }
}

/// Process-wide settings, persisted through a key-value store
pub struct SettingsContext {
    store: SharedStore,
    tx: watch::Sender<Settings>,
}

impl SettingsContext {
    /// Read settings from `store`, falling back to the configured generation defaults.
    pub fn load(store: SharedStore, defaults: &GenerationConfig) -> Result<Self> {
        let credential: String = kv::get_json(store.as_ref(), keys::API_KEY)?.unwrap_or_default();
        let model: String =
            kv::get_json(store.as_ref(), keys::MODEL)?.unwrap_or_else(|| defaults.default_model.clone());
        let temperature: f32 = kv::get_json(store.as_ref(), keys::TEMPERATURE)?
            .filter(|t: &f32| (0.0..=1.0).contains(t))
            .unwrap_or(defaults.default_temperature);

        let settings = Settings { credential, model, temperature };
        debug!(
            model = %settings.model,
            temperature = settings.temperature,
            credential = %settings.masked_credential(),
            "Loaded settings"
        );

        let (tx, _rx) = watch::channel(settings);
        Ok(Self { store, tx })
    }

    /// Defaults backed by a throwaway in-memory store
    pub fn in_memory() -> Self {
        let (tx, _rx) = watch::channel(Settings::default());
        Self { store: MemoryKeyValueStore::shared(), tx }
    }

    pub fn current(&self) -> Settings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn has_credential(&self) -> bool {
        self.tx.borrow().has_credential()
    }

    pub fn set_credential(&self, credential: impl Into<String>) -> Result<()> {
        let credential = credential.into().trim().to_string();
        kv::set_json(self.store.as_ref(), keys::API_KEY, &credential)?;
        debug!(credential = %mask_credential(&credential), "Updated API key");
        self.tx.send_modify(|s| s.credential = credential);
        Ok(())
    }

    /// Any non-empty model id is accepted; ids outside [`MODELS`] are logged.
    pub fn set_model(&self, model: impl Into<String>) -> Result<()> {
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(Error::Validation("model must not be empty".to_string()));
        }
        if find_model(&model).is_none() {
            warn!(model = %model, "Using a model outside the known list");
        }
        kv::set_json(self.store.as_ref(), keys::MODEL, &model)?;
        self.tx.send_modify(|s| s.model = model);
        Ok(())
    }

    pub fn set_temperature(&self, temperature: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(Error::Validation(format!(
                "temperature must be between 0.0 and 1.0, got {}",
                temperature
            )));
        }
        kv::set_json(self.store.as_ref(), keys::TEMPERATURE, &temperature)?;
        self.tx.send_modify(|s| s.temperature = temperature);
        Ok(())
    }

    /// Selected option value of a group template; the first option when nothing valid is stored.
    /// Single templates have no options and yield `None`.
    pub fn selected_option(&self, template: &Template) -> Option<&'static str> {
        let default = template.default_option()?;
        let stored: Option<String> = match kv::get_json(self.store.as_ref(), &keys::selected_option(template.title())) {
            Ok(value) => value,
            Err(e) => {
                warn!(template = template.title(), error = %e, "Ignoring unreadable option selection");
                None
            }
        };

        let selected = stored
            .and_then(|value| template.find_option(&value))
            .unwrap_or(default);
        Some(selected.value)
    }

    pub fn set_selected_option(&self, template: &Template, value: &str) -> Result<()> {
        if template.find_option(value).is_none() {
            return Err(Error::Validation(format!(
                "'{}' is not an option of '{}'",
                value,
                template.title()
            )));
        }
        kv::set_json(self.store.as_ref(), &keys::selected_option(template.title()), &value)
    }
}
