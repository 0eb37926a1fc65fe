use super::input::EditorBuffer;
use peditor_core::logging::mask_credential;
use peditor_core::{MODELS, Settings};

/// Fields of the settings dialog, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    Model,
    Temperature,
}

impl SettingsField {
    pub const VALUES: &[SettingsField] = &[SettingsField::ApiKey, SettingsField::Model, SettingsField::Temperature];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::ApiKey => "API key",
            SettingsField::Model => "Model",
            SettingsField::Temperature => "Temperature",
        }
    }

    fn offset(&self, delta: isize) -> SettingsField {
        let len = Self::VALUES.len() as isize;
        let index = Self::VALUES.iter().position(|f| f == self).unwrap_or(0) as isize;
        Self::VALUES[(index + delta).rem_euclid(len) as usize]
    }
}

/// Draft settings being edited; nothing is persisted until saved
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDialogState {
    pub field: SettingsField,
    pub key: EditorBuffer,
    pub reveal_key: bool,
    pub model: String,
    pub temperature: f32,
}

impl SettingsDialogState {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut key = EditorBuffer::new();
        key.set_text(settings.credential.clone());
        Self {
            field: SettingsField::ApiKey,
            key,
            reveal_key: false,
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    pub fn next_field(&mut self) {
        self.field = self.field.offset(1);
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.offset(-1);
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_key = !self.reveal_key;
    }

    /// Key as shown in the dialog
    pub fn key_display(&self) -> String {
        if self.reveal_key { self.key.text().to_string() } else { mask_credential(self.key.text()) }
    }

    /// Step through the known models; a model outside the list restarts at the first one.
    pub fn cycle_model(&mut self, forward: bool) {
        let next = match MODELS.iter().position(|m| m.id == self.model) {
            Some(i) if forward => (i + 1) % MODELS.len(),
            Some(i) => (i + MODELS.len() - 1) % MODELS.len(),
            None => 0,
        };
        self.model = MODELS[next].id.to_string();
    }

    /// Step the temperature by `delta`, clamped to 0.0..=1.0 at one decimal
    pub fn adjust_temperature(&mut self, delta: f32) {
        let value = ((self.temperature + delta) * 10.0).round() / 10.0;
        self.temperature = value.clamp(0.0, 1.0);
    }

    pub fn credential(&self) -> &str {
        self.key.text().trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> SettingsDialogState {
        SettingsDialogState::from_settings(&Settings {
            credential: "sk-1234567890abcdef".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        })
    }

    #[test]
    fn test_field_order_wraps() {
        let mut d = dialog();
        assert_eq!(d.field, SettingsField::ApiKey);
        d.next_field();
        assert_eq!(d.field, SettingsField::Model);
        d.next_field();
        d.next_field();
        assert_eq!(d.field, SettingsField::ApiKey);
        d.prev_field();
        assert_eq!(d.field, SettingsField::Temperature);
    }

    #[test]
    fn test_key_masked_until_revealed() {
        let mut d = dialog();
        assert_eq!(d.key_display(), "********cdef");
        d.toggle_reveal();
        assert_eq!(d.key_display(), "sk-1234567890abcdef");
    }

    #[test]
    fn test_cycle_models() {
        let mut d = dialog();
        d.cycle_model(true);
        assert_eq!(d.model, "gpt-4o-mini");
        d.cycle_model(false);
        d.cycle_model(false);
        assert_eq!(d.model, "o3-mini");

        d.model = "custom-model".to_string();
        d.cycle_model(true);
        assert_eq!(d.model, "gpt-4o");
    }

    #[test]
    fn test_temperature_steps_and_clamps() {
        let mut d = dialog();
        d.adjust_temperature(0.1);
        assert_eq!(d.temperature, 0.8);
        for _ in 0..5 {
            d.adjust_temperature(0.1);
        }
        assert_eq!(d.temperature, 1.0);
        for _ in 0..15 {
            d.adjust_temperature(-0.1);
        }
        assert_eq!(d.temperature, 0.0);
    }
}
