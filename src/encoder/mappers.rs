//! Field mappers turn an event into additional GELF fields.
//!
//! A mapper is a pure function from an event to key/value pairs. The
//! encoder runs the built-in mappers first, in the order returned by
//! [`built_in`], followed by user mappers in registration order. Every pair
//! goes through the same name validation regardless of its origin.

use std::sync::Arc;

use crate::event::GelfEvent;

use super::{EncoderConfig, field::FieldValue};

pub type FieldPairs = Vec<(String, FieldValue)>;

/// Shared, thread-safe mapper function.
pub type FieldMapper = Arc<dyn Fn(&GelfEvent) -> FieldPairs + Send + Sync>;

/// Wrap a closure as a [`FieldMapper`].
pub fn field_mapper<F>(mapper: F) -> FieldMapper
where
    F: Fn(&GelfEvent) -> FieldPairs + Send + Sync + 'static,
{
    Arc::new(mapper)
}

/// Map a single optional value to a fixed field name.
pub fn simple<F>(name: impl Into<String>, getter: F) -> FieldMapper
where
    F: Fn(&GelfEvent) -> Option<FieldValue> + Send + Sync + 'static,
{
    let name = name.into();
    field_mapper(move |event| {
        getter(event)
            .map(|value| vec![(name.clone(), value)])
            .unwrap_or_default()
    })
}

pub fn caller_data() -> FieldMapper {
    field_mapper(|event| {
        let Some(caller) = &event.metadata.caller else {
            return Vec::new();
        };
        vec![
            ("source_file_name".into(), caller.file.as_str().into()),
            ("source_method_name".into(), caller.function.as_str().into()),
            ("source_class_name".into(), caller.module_path.as_str().into()),
            ("source_line_number".into(), caller.line.into()),
        ]
    })
}

/// Innermost link of the exception chain.
pub fn root_cause() -> FieldMapper {
    field_mapper(|event| {
        let Some(root) = event.metadata.exception.last() else {
            return Vec::new();
        };
        let mut pairs = vec![("root_cause_class_name".into(), root.type_name.as_str().into())];
        if let Some(message) = &root.message {
            pairs.push(("root_cause_message".into(), message.as_str().into()));
        }
        pairs
    })
}

pub fn marker(name: impl Into<String>) -> FieldMapper {
    simple(name, |event| {
        event
            .metadata
            .marker
            .as_ref()
            .map(|marker| FieldValue::String(marker.to_string()))
    })
}

pub fn mdc() -> FieldMapper {
    field_mapper(|event| {
        event
            .metadata
            .mdc
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::String(v.clone())))
            .collect()
    })
}

pub fn key_values() -> FieldMapper {
    field_mapper(|event| event.metadata.key_values.clone())
}

/// Built-in mappers enabled by `config`, in application order.
pub(crate) fn built_in(config: &EncoderConfig) -> Vec<FieldMapper> {
    let mut mappers = vec![
        simple(config.logger_name_key.clone(), |event| {
            Some(FieldValue::String(event.logger.clone()))
        }),
        simple(config.thread_name_key.clone(), |event| {
            event.metadata.thread_name.clone().map(FieldValue::String)
        }),
    ];
    if config.include_level_name {
        mappers.push(simple(config.level_name_key.clone(), |event| {
            Some(FieldValue::String(event.level.as_str().to_owned()))
        }));
    }
    if config.include_raw_message {
        mappers.push(simple("raw_message", |event| {
            event.raw_message.clone().map(FieldValue::String)
        }));
    }
    if config.include_caller_data {
        mappers.push(caller_data());
    }
    if config.include_root_cause_data {
        mappers.push(root_cause());
    }
    if config.include_marker {
        mappers.push(marker("marker"));
    }
    if config.include_mdc_data {
        mappers.push(mdc());
    }
    mappers.push(key_values());
    mappers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CallerData, ExceptionInfo, Marker};
    use crate::level::GelfLevel;

    fn event() -> GelfEvent {
        GelfEvent::new("app.db", GelfLevel::Error, "boom")
    }

    #[test]
    fn caller_data_emits_four_fields() {
        let event = event().with_caller(CallerData {
            file: "db.rs".into(),
            function: "connect".into(),
            module_path: "app::db".into(),
            line: 42,
        });
        let pairs = caller_data()(&event);
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[3], ("source_line_number".into(), FieldValue::from(42u32)));
    }

    #[test]
    fn root_cause_uses_innermost_link() {
        let event = event().with_exception(vec![
            ExceptionInfo::new("Outer", Some("wrapped".into())),
            ExceptionInfo::new("Inner", Some("cause".into())),
        ]);
        let pairs = root_cause()(&event);
        assert_eq!(
            pairs,
            vec![
                ("root_cause_class_name".into(), "Inner".into()),
                ("root_cause_message".into(), "cause".into()),
            ]
        );
    }

    #[test]
    fn mappers_without_data_emit_nothing() {
        let event = event();
        assert!(caller_data()(&event).is_empty());
        assert!(root_cause()(&event).is_empty());
        assert!(marker("marker")(&event).is_empty());
    }

    #[test]
    fn marker_mapper_renders_references() {
        let event = event().with_marker(Marker::new("A").with_reference("B"));
        assert_eq!(
            marker("marker")(&event),
            vec![("marker".into(), FieldValue::String("A, B".into()))]
        );
    }

    #[test]
    fn built_in_order_follows_configuration() {
        let config = EncoderConfig {
            include_level_name: true,
            ..EncoderConfig::default()
        };
        let event = event().with_mdc("request", "r-1");
        let keys: Vec<String> = built_in(&config)
            .iter()
            .flat_map(|mapper| mapper(&event))
            .map(|(k, _)| k)
            .collect();
        let logger = keys.iter().position(|k| k == "logger_name").expect("logger");
        let level = keys.iter().position(|k| k == "level_name").expect("level");
        let mdc = keys.iter().position(|k| k == "request").expect("mdc");
        assert!(logger < level && level < mdc);
    }
}
