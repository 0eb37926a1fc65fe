use std::fmt;

/// User-facing messages shared by the UI and the CLI
pub mod messages {
    pub const MOVED_TO_INPUT: &str = "Output text moved to input";
    pub const ALREADY_IN_INPUTS: &str = "This text is already in your inputs";
    pub const NOTHING_TO_MOVE: &str = "There is no output to move";
    pub const INPUT_COPIED: &str = "Input text copied to clipboard";
    pub const OUTPUT_COPIED: &str = "Output text copied to clipboard";
    pub const COPY_FAILED: &str = "Failed to copy text to clipboard";
    pub const API_KEY_REQUIRED: &str = "Please enter an API key to use the AI features.";
    pub const EMPTY_INPUT: &str = "Type or paste some text first";
    pub const BUSY: &str = "A generation is already running";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors() {
        assert_eq!(Notice::info("a").level, NoticeLevel::Info);
        assert_eq!(Notice::warning("b").level, NoticeLevel::Warning);
        let err = Notice::error(messages::COPY_FAILED);
        assert_eq!(err.level, NoticeLevel::Error);
        assert_eq!(err.to_string(), "Failed to copy text to clipboard");
    }

    #[test]
    fn test_notice_level_ordering() {
        assert!(NoticeLevel::Error > NoticeLevel::Warning);
        assert!(NoticeLevel::Warning > NoticeLevel::Info);
        assert_eq!(NoticeLevel::Warning.as_str(), "warning");
    }
}
