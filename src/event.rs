//! Log event representation consumed by the GELF encoder.
//!
//! `GelfEvent` is the only shape the crate requires from an upstream
//! logging source: a message with its severity and timestamp plus the
//! optional context (MDC, marker, caller, exception chain) that built-in
//! field mappers turn into additional GELF fields.

use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{encoder::FieldValue, level::GelfLevel};

/// Named marker with optional references, rendered as `name, ref1, ref2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub references: Vec<String>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for reference in &self.references {
            write!(f, ", {reference}")?;
        }
        Ok(())
    }
}

/// Source location of the log call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerData {
    pub file: String,
    pub function: String,
    pub module_path: String,
    pub line: u32,
}

/// One link of an exception chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: Option<String>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message,
        }
    }

    /// Build a chain from a `std::error::Error`, walking `source()` links.
    pub fn chain_from_error(err: &(dyn std::error::Error + 'static)) -> Vec<Self> {
        let mut chain = Vec::new();
        let mut current = Some(err);
        while let Some(e) = current {
            chain.push(Self::new(error_type_name(e), Some(e.to_string())));
            current = e.source();
        }
        chain
    }
}

fn error_type_name(err: &dyn std::error::Error) -> String {
    // Debug output starts with the type or variant name for derived impls.
    let debug = format!("{err:?}");
    debug
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("Error")
        .to_owned()
}

/// Contextual metadata attached to an event.
#[derive(Clone, Debug)]
pub struct EventMetadata {
    /// Time the event was created.
    pub timestamp: SystemTime,
    /// Name of the thread that created the event, if any.
    pub thread_name: Option<String>,
    pub marker: Option<Marker>,
    /// Mapped diagnostic context; string values only.
    pub mdc: BTreeMap<String, String>,
    /// Structured key/value arguments supplied with the call.
    pub key_values: Vec<(String, FieldValue)>,
    pub caller: Option<CallerData>,
    /// Exception chain, outermost first.
    pub exception: Vec<ExceptionInfo>,
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_name: thread::current().name().map(ToString::to_string),
            marker: None,
            mdc: BTreeMap::new(),
            key_values: Vec::new(),
            caller: None,
            exception: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GelfEvent {
    /// Name of the logger that produced the event.
    pub logger: String,
    pub level: GelfLevel,
    /// Fully formatted message.
    pub message: String,
    /// Message template before argument substitution.
    pub raw_message: Option<String>,
    /// Explicit full message; derived from the exception chain when absent.
    pub full_message: Option<String>,
    pub metadata: EventMetadata,
}

impl GelfEvent {
    /// Construct an event stamped with the current time and thread.
    pub fn new(logger: &str, level: GelfLevel, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            raw_message: None,
            full_message: None,
            metadata: EventMetadata::default(),
        }
    }

    /// Construct an event with explicit metadata.
    pub fn with_metadata(
        logger: &str,
        level: GelfLevel,
        message: &str,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            metadata,
            ..Self::new(logger, level, message)
        }
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.metadata.timestamp = timestamp;
        self
    }

    pub fn with_full_message(mut self, full_message: impl Into<String>) -> Self {
        self.full_message = Some(full_message.into());
        self
    }

    pub fn with_raw_message(mut self, raw_message: impl Into<String>) -> Self {
        self.raw_message = Some(raw_message.into());
        self
    }

    pub fn with_mdc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.mdc.insert(key.into(), value.into());
        self
    }

    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.metadata.key_values.push((key.into(), value.into()));
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.metadata.marker = Some(marker);
        self
    }

    pub fn with_caller(mut self, caller: CallerData) -> Self {
        self.metadata.caller = Some(caller);
        self
    }

    pub fn with_exception(mut self, chain: Vec<ExceptionInfo>) -> Self {
        self.metadata.exception = chain;
        self
    }

    /// Milliseconds since the UNIX epoch; negative before it.
    pub fn timestamp_millis(&self) -> i64 {
        match self.metadata.timestamp.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Message followed by the rendered exception chain, if any.
    pub fn render_full_message(&self) -> String {
        if let Some(full) = &self.full_message {
            return full.clone();
        }
        let mut rendered = self.message.clone();
        for (idx, link) in self.metadata.exception.iter().enumerate() {
            rendered.push('\n');
            if idx > 0 {
                rendered.push_str("Caused by: ");
            }
            rendered.push_str(&link.type_name);
            if let Some(message) = &link.message {
                rendered.push_str(": ");
                rendered.push_str(message);
            }
        }
        rendered
    }
}

impl fmt::Display for GelfEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
