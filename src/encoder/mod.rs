//! GELF message encoding.
//!
//! [`GelfEncoder`] turns a [`GelfEvent`] into the flat JSON object
//! described by GELF 1.1. Static fields are seeded first, then the
//! built-in field mappers run, then user mappers. Invalid or duplicate
//! field names never abort encoding: the offending pair is dropped and a
//! warning is logged. A mapper that panics loses its fields; the rest of
//! the message is still built.

mod field;
mod formatter;
pub mod mappers;
mod message;


use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::{builders::ConfigError, event::GelfEvent};

pub use field::{
    AdditionalFields, AdditionalFieldsBuilder, FieldError, FieldValue, validate_field_name,
};
pub use mappers::{FieldMapper, field_mapper};
pub use message::{
    DEFAULT_MAX_SHORT_MESSAGE_LENGTH, EMPTY_SHORT_MESSAGE, GELF_VERSION, GelfMessage,
    GelfMessageBuilder, encode, format_timestamp, sanitize_short_message,
};

/// Host reported when the local hostname cannot be determined.
pub const UNKNOWN_HOST: &str = "unknown";

/// Encoder settings. Every field has a default, so partial configuration
/// documents deserialize cleanly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Origin host; detected from the system when unset or blank.
    pub origin_host: Option<String>,
    pub include_raw_message: bool,
    pub include_marker: bool,
    pub include_mdc_data: bool,
    pub include_caller_data: bool,
    pub include_root_cause_data: bool,
    pub include_level_name: bool,
    pub level_name_key: String,
    pub logger_name_key: String,
    pub thread_name_key: String,
    /// Append a newline after each message. Only meaningful for console
    /// output; network senders reject encoders with this set.
    pub append_newline: bool,
    pub numbers_as_string: bool,
    pub max_short_message_length: usize,
    /// Static fields in `key:value` form.
    pub static_fields: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            origin_host: None,
            include_raw_message: false,
            include_marker: true,
            include_mdc_data: true,
            include_caller_data: false,
            include_root_cause_data: false,
            include_level_name: false,
            level_name_key: "level_name".into(),
            logger_name_key: "logger_name".into(),
            thread_name_key: "thread_name".into(),
            append_newline: false,
            numbers_as_string: false,
            max_short_message_length: DEFAULT_MAX_SHORT_MESSAGE_LENGTH,
            static_fields: Vec::new(),
        }
    }
}

/// Encodes events into GELF JSON payloads.
#[derive(Clone)]
pub struct GelfEncoder {
    config: EncoderConfig,
    origin_host: String,
    static_fields: Vec<(String, FieldValue)>,
    mappers: Vec<FieldMapper>,
}

impl GelfEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self, ConfigError> {
        if config.max_short_message_length < EMPTY_SHORT_MESSAGE.len() {
            return Err(ConfigError::InvalidConfig(format!(
                "max_short_message_length must be at least {}",
                EMPTY_SHORT_MESSAGE.len()
            )));
        }
        for (label, key) in [
            ("level_name_key", &config.level_name_key),
            ("logger_name_key", &config.logger_name_key),
            ("thread_name_key", &config.thread_name_key),
        ] {
            validate_field_name(key)
                .map_err(|err| ConfigError::InvalidConfig(format!("{label}: {err}")))?;
        }
        let origin_host = match config.origin_host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => detect_hostname(),
        };
        let static_fields = parse_static_fields(&config.static_fields, config.numbers_as_string);
        let mappers = mappers::built_in(&config);
        Ok(Self {
            config,
            origin_host,
            static_fields,
            mappers,
        })
    }

    /// Register a user mapper; it runs after the built-in mappers.
    pub fn with_field_mapper(mut self, mapper: FieldMapper) -> Self {
        self.mappers.push(mapper);
        self
    }

    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn appends_newline(&self) -> bool {
        self.config.append_newline
    }

    /// Build the message value for `event`.
    pub fn to_message(&self, event: &GelfEvent) -> GelfMessage {
        let mut fields = AdditionalFields::builder(self.config.numbers_as_string);
        for (name, value) in &self.static_fields {
            // Static fields were validated and de-duplicated at construction.
            let _ = fields.add(name.clone(), value.clone());
        }
        for mapper in &self.mappers {
            let pairs = match panic::catch_unwind(AssertUnwindSafe(|| mapper(event))) {
                Ok(pairs) => pairs,
                Err(payload) => {
                    error!("Field mapper panicked: {}", panic_message(payload.as_ref()));
                    continue;
                }
            };
            for (name, value) in pairs {
                if let Err(err) = fields.add(name, value) {
                    warn!("GelfEncoder could not add field: {err}");
                }
            }
        }
        GelfMessage::builder(self.origin_host.clone(), event.message.clone())
            .full_message(Some(event.render_full_message()))
            .timestamp_millis(event.timestamp_millis())
            .level(event.level)
            .additional_fields(fields.build())
            .max_short_message_length(self.config.max_short_message_length)
            .build()
    }

    /// Encode `event` as GELF JSON, newline-terminated when configured.
    pub fn encode(&self, event: &GelfEvent) -> serde_json::Result<Vec<u8>> {
        let mut json = self.to_message(event).to_json()?;
        if self.config.append_newline {
            json.push(b'\n');
        }
        Ok(json)
    }
}

impl std::fmt::Debug for GelfEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GelfEncoder")
            .field("origin_host", &self.origin_host)
            .field("static_fields", &self.static_fields)
            .field("mappers", &self.mappers.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic payload"
    }
}

fn detect_hostname() -> String {
    match hostname::get() {
        Ok(name) => {
            let name = name.to_string_lossy().trim().to_owned();
            if name.is_empty() {
                UNKNOWN_HOST.to_owned()
            } else {
                name
            }
        }
        Err(err) => {
            warn!("GelfEncoder could not determine local hostname: {err}");
            UNKNOWN_HOST.to_owned()
        }
    }
}

/// Parse `key:value` entries. The first definition of a key wins.
fn parse_static_fields(entries: &[String], numbers_as_string: bool) -> Vec<(String, FieldValue)> {
    let mut fields = AdditionalFields::builder(numbers_as_string);
    for entry in entries {
        let Some((key, value)) = entry.split_once(':') else {
            warn!("staticField must be in format key:value - rejecting '{entry}'");
            continue;
        };
        if let Err(err) = fields.add(key.trim(), FieldValue::String(value.trim().to_owned())) {
            warn!("GelfEncoder could not add static field '{entry}': {err}");
        }
    }
    fields
        .build()
        .iter()
        .map(|(k, v)| (k.to_owned(), v.clone()))
        .collect()
}
