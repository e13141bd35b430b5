//! User-visible page messages.

use serde::Serialize;

/// Severity of a page message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Something failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    Info,
    /// Something succeeded.
    Success,
}

impl MessageLevel {
    /// Returns the CSS class used by the layout.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

/// A message shown in the page message region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMessage {
    /// Severity.
    pub level: MessageLevel,
    /// Translated text.
    pub text: String,
}

/// Messages collected while handling a request.
///
/// Pushing a text that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMessages(Vec<PageMessage>);

impl PageMessages {
    /// Adds a message.
    pub fn push(&mut self, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        if !self.contains(&text) {
            self.0.push(PageMessage { level, text });
        }
    }

    /// Adds an error message.
    pub fn error(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Error, text);
    }

    /// Adds a warning message.
    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Warning, text);
    }

    /// Checks if a message with `text` is present.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.0.iter().any(|m| m.text == text)
    }

    /// Checks if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the messages in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, PageMessage> {
        self.0.iter()
    }
}
