//! Diagnostic messages and the message sink.
//!
//! Every error, warning, or info produced while scheduling is recorded as
//! a [`Message`] in a [`MessageHandler`]. The handler is created by the
//! caller and passed into the scheduler; it logs each message through
//! `tracing` and keeps the error tally the driver checks between
//! scenarios.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageLevel {
    /// Unrecoverable error.
    Fatal,
    /// Error that aborts the current scenario.
    Error,
    /// Suspicious input, scheduling continues.
    Warning,
    /// Informational note.
    Info,
    /// Developer diagnostics.
    Debug,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageLevel::Fatal => "Fatal",
            MessageLevel::Error => "Error",
            MessageLevel::Warning => "Warning",
            MessageLevel::Info => "Info",
            MessageLevel::Debug => "Debug",
        };
        f.write_str(s)
    }
}

/// Position in a project source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File name.
    pub file: String,
    /// Line number (1-based).
    pub line: usize,
}

impl SourceLocation {
    /// Creates a new source location.
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Severity.
    pub level: MessageLevel,
    /// Stable message identifier (e.g. `effort_not_completed`).
    pub id: String,
    /// Human-readable text.
    pub text: String,
    /// ID of the property the message is about.
    pub property: Option<String>,
    /// ID of the scenario the message is about.
    pub scenario: Option<String>,
    /// Where the offending input was defined.
    pub source_location: Option<SourceLocation>,
}

impl Message {
    /// Creates a message without property or scenario context.
    pub fn new(level: MessageLevel, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            id: id.into(),
            text: text.into(),
            property: None,
            scenario: None,
            source_location: None,
        }
    }

    /// Attaches the property ID.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Attaches the scenario ID.
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// Attaches a source location.
    pub fn with_source_location(mut self, location: Option<SourceLocation>) -> Self {
        self.source_location = location;
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.source_location {
            write!(f, "{loc}: ")?;
        }
        write!(f, "{}: ", self.level)?;
        if let Some(scenario) = &self.scenario {
            write!(f, "[{scenario}] ")?;
        }
        if let Some(property) = &self.property {
            write!(f, "{property}: ")?;
        }
        f.write_str(&self.text)
    }
}

/// Central message sink for one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct MessageHandler {
    messages: Vec<Message>,
    error_count: usize,
    scenario_ids: Vec<String>,
}

impl MessageHandler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scenario IDs used to label scenario-indexed messages.
    pub fn set_scenarios(&mut self, ids: Vec<String>) {
        self.scenario_ids = ids;
    }

    /// ID of scenario `idx`, or `#idx` if unknown.
    pub fn scenario_id(&self, idx: usize) -> String {
        self.scenario_ids
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("#{idx}"))
    }

    /// Records and logs a message.
    pub fn send(&mut self, message: Message) {
        let property = message.property.as_deref().unwrap_or("");
        let scenario = message.scenario.as_deref().unwrap_or("");
        match message.level {
            MessageLevel::Fatal | MessageLevel::Error => {
                self.error_count += 1;
                tracing::error!(message_id = %message.id, property, scenario, "{}", message.text);
            }
            MessageLevel::Warning => {
                tracing::warn!(message_id = %message.id, property, scenario, "{}", message.text);
            }
            MessageLevel::Info => {
                tracing::info!(message_id = %message.id, property, scenario, "{}", message.text);
            }
            MessageLevel::Debug => {
                tracing::debug!(message_id = %message.id, property, scenario, "{}", message.text);
            }
        }
        self.messages.push(message);
    }

    /// Records a project-level error.
    pub fn error(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.send(Message::new(MessageLevel::Error, id, text));
    }

    /// Records a project-level warning.
    pub fn warning(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.send(Message::new(MessageLevel::Warning, id, text));
    }

    /// Records a project-level info message.
    pub fn info(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.send(Message::new(MessageLevel::Info, id, text));
    }

    /// Number of errors (including fatal ones) recorded so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// All recorded messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages of one level.
    pub fn messages_at(&self, level: MessageLevel) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.level == level)
    }

    /// Removes all messages and resets the error tally.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.error_count = 0;
    }
}
