use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a surfaced message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub timestamp: DateTime<Utc>,
    pub level: MessageLevel,
    pub text: String,
}

impl MessageEntry {
    pub fn new(level: MessageLevel, text: String) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            text,
        }
    }
}

/// User-visible message surface. Entries are dismissible by the shell:
/// they accumulate here and are drained when displayed.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<MessageEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: MessageLevel, text: impl Into<String>) {
        self.entries.push(MessageEntry::new(level, text.into()));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Error, text);
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn drain(&mut self) -> Vec<MessageEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
