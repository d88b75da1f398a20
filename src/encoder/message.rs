//! The GELF 1.1 message value object and its JSON rendering.

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::level::GelfLevel;

use super::{
    field::{AdditionalFields, FieldValue},
    formatter::to_gelf_json,
};

pub const GELF_VERSION: &str = "1.1";
/// Default cap on the sanitized short message, in characters.
pub const DEFAULT_MAX_SHORT_MESSAGE_LENGTH: usize = 250;
/// Substituted when a short message is empty after sanitization.
pub const EMPTY_SHORT_MESSAGE: &str = "(empty)";

const INITIAL_JSON_SIZE: usize = 256;

/// Collapse whitespace runs, trim, and cap the length of a short message.
///
/// Never returns an empty string. Applying it twice yields the same result
/// as long as `max_len` is at least the placeholder length.
pub fn sanitize_short_message(message: &str, max_len: usize) -> String {
    let mut collapsed = String::with_capacity(message.len().min(max_len.saturating_mul(4)));
    let mut chars = 0usize;
    'words: for word in message.split_whitespace() {
        if chars > 0 {
            if chars == max_len {
                break;
            }
            collapsed.push(' ');
            chars += 1;
        }
        for ch in word.chars() {
            if chars == max_len {
                break 'words;
            }
            collapsed.push(ch);
            chars += 1;
        }
    }
    let trimmed_len = collapsed.trim_end().len();
    collapsed.truncate(trimmed_len);
    if collapsed.is_empty() {
        EMPTY_SHORT_MESSAGE.to_owned()
    } else {
        collapsed
    }
}

/// Render epoch milliseconds as fixed-point seconds, e.g. `1577836800.123`.
pub fn format_timestamp(millis: i64) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let abs = millis.unsigned_abs();
    format!("{sign}{}.{:03}", abs / 1000, abs % 1000)
}

/// A single GELF message, discarded after encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct GelfMessage {
    host: String,
    short_message: String,
    full_message: Option<String>,
    timestamp_millis: i64,
    level: GelfLevel,
    additional_fields: AdditionalFields,
}

impl GelfMessage {
    pub fn builder(host: impl Into<String>, short_message: impl Into<String>) -> GelfMessageBuilder {
        GelfMessageBuilder {
            host: host.into(),
            short_message: short_message.into(),
            full_message: None,
            timestamp_millis: 0,
            level: GelfLevel::default(),
            additional_fields: AdditionalFields::default(),
            max_short_message_length: DEFAULT_MAX_SHORT_MESSAGE_LENGTH,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn short_message(&self) -> &str {
        &self.short_message
    }

    pub fn full_message(&self) -> Option<&str> {
        self.full_message.as_deref()
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    pub fn level(&self) -> GelfLevel {
        self.level
    }

    pub fn additional_fields(&self) -> &AdditionalFields {
        &self.additional_fields
    }

    /// Serialize to the GELF wire form: one compact JSON object.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        to_gelf_json(self, INITIAL_JSON_SIZE)
    }
}

impl Serialize for GelfMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("version", GELF_VERSION)?;
        map.serialize_entry("host", &self.host)?;
        map.serialize_entry("short_message", &self.short_message)?;
        if let Some(full) = self.full_message() {
            map.serialize_entry("full_message", full)?;
        }
        let timestamp = FieldValue::Number(format_timestamp(self.timestamp_millis));
        map.serialize_entry("timestamp", &timestamp)?;
        map.serialize_entry("level", &self.level.severity())?;
        for (name, value) in self.additional_fields.iter() {
            map.serialize_entry(&format!("_{name}"), value)?;
        }
        map.end()
    }
}

pub struct GelfMessageBuilder {
    host: String,
    short_message: String,
    full_message: Option<String>,
    timestamp_millis: i64,
    level: GelfLevel,
    additional_fields: AdditionalFields,
    max_short_message_length: usize,
}

impl GelfMessageBuilder {
    pub fn full_message(mut self, full_message: Option<String>) -> Self {
        self.full_message = full_message;
        self
    }

    pub fn timestamp_millis(mut self, millis: i64) -> Self {
        self.timestamp_millis = millis;
        self
    }

    pub fn level(mut self, level: GelfLevel) -> Self {
        self.level = level;
        self
    }

    pub fn additional_fields(mut self, fields: AdditionalFields) -> Self {
        self.additional_fields = fields;
        self
    }

    pub fn max_short_message_length(mut self, max_len: usize) -> Self {
        self.max_short_message_length = max_len;
        self
    }

    pub fn build(self) -> GelfMessage {
        debug_assert!(!self.host.is_empty(), "GELF host must not be empty");
        GelfMessage {
            short_message: sanitize_short_message(
                &self.short_message,
                self.max_short_message_length,
            ),
            full_message: self.full_message.filter(|full| !full.is_empty()),
            host: self.host,
            timestamp_millis: self.timestamp_millis,
            level: self.level,
            additional_fields: self.additional_fields,
        }
    }
}

/// Encode one message from scalar inputs using the default length cap.
pub fn encode(
    host: &str,
    short_message: &str,
    full_message: Option<&str>,
    timestamp_millis: i64,
    level: GelfLevel,
    additional_fields: AdditionalFields,
) -> serde_json::Result<Vec<u8>> {
    GelfMessage::builder(host, short_message)
        .full_message(full_message.map(str::to_owned))
        .timestamp_millis(timestamp_millis)
        .level(level)
        .additional_fields(additional_fields)
        .build()
        .to_json()
}
