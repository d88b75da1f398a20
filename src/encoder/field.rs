//! Additional-field values and the rules GELF imposes on their names.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

/// Additional field names: ASCII word characters, dots and dashes. The
/// leading `_` is added on the wire and is not part of the name.
static VALID_FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("field name pattern is valid"));

/// Decimal literals accepted for numeric promotion: optional sign, digits
/// with an optional fraction (either side may be empty but not both) and an
/// optional exponent.
static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?([eE][+-]?[0-9]+)?$")
        .expect("decimal literal pattern is valid")
});

/// Reasons an additional field is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field name must not be empty")]
    Empty,
    #[error("field name '{0}' is reserved")]
    Reserved(String),
    #[error("field name '{0}' is illegal; names must match ^[\\w.-]+$")]
    Illegal(String),
    #[error("field '{0}' is already defined")]
    Duplicate(String),
}

/// Scalar value of an additional field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    String(String),
    /// A literal that is known to be a valid JSON number.
    Number(String),
    Bool(bool),
}

impl FieldValue {
    /// Rewrite a decimal literal into canonical JSON number form.
    ///
    /// A leading `+` is dropped, redundant leading zeros are trimmed and a
    /// bare `.` gains the missing digit, so `"007"`, `"+5"` and `".5"` become
    /// `7`, `5` and `0.5`. Returns `None` for anything that is not a finite
    /// decimal, including text with surrounding whitespace.
    pub fn normalize_number(text: &str) -> Option<String> {
        let caps = DECIMAL_LITERAL.captures(text)?;
        let sign = &caps[1];
        let int = &caps[2];
        let frac = caps.get(3).map_or("", |m| m.as_str());
        let exponent = caps.get(4).map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        let int = match int.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };
        let mut literal = String::with_capacity(text.len() + 1);
        if sign == "-" {
            literal.push('-');
        }
        literal.push_str(int);
        if !frac.is_empty() {
            literal.push('.');
            literal.push_str(frac);
        }
        literal.push_str(exponent);
        serde_json::from_str::<serde_json::Number>(&literal)
            .is_ok()
            .then_some(literal)
    }

    /// Promote numeric-looking strings to numbers.
    fn promote_numeric(self) -> Self {
        match self {
            FieldValue::String(text) => match Self::normalize_number(&text) {
                Some(literal) => FieldValue::Number(literal),
                None => FieldValue::String(text),
            },
            other => other,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::String(text) => serializer.serialize_str(text),
            FieldValue::Number(literal) => RawValue::from_string(literal.clone())
                .map_err(<S::Error as serde::ser::Error>::custom)?
                .serialize(serializer),
            FieldValue::Bool(flag) => serializer.serialize_bool(*flag),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_owned())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Number(value.to_string())
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            FieldValue::Number(value.to_string())
        } else {
            FieldValue::String(value.to_string())
        }
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::from(f64::from(value))
    }
}

/// Validate an additional field name.
pub fn validate_field_name(name: &str) -> Result<(), FieldError> {
    if name.is_empty() {
        return Err(FieldError::Empty);
    }
    if name.eq_ignore_ascii_case("id") {
        return Err(FieldError::Reserved(name.to_owned()));
    }
    if !VALID_FIELD_NAME.is_match(name) {
        return Err(FieldError::Illegal(name.to_owned()));
    }
    Ok(())
}

/// Immutable, validated set of additional fields in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdditionalFields {
    fields: Vec<(String, FieldValue)>,
}

impl AdditionalFields {
    pub fn builder(numbers_as_string: bool) -> AdditionalFieldsBuilder {
        AdditionalFieldsBuilder {
            fields: Vec::new(),
            seen: HashSet::new(),
            numbers_as_string,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects fields for one message. The first value for a key wins; later
/// attempts fail with [`FieldError::Duplicate`].
#[derive(Debug)]
pub struct AdditionalFieldsBuilder {
    fields: Vec<(String, FieldValue)>,
    seen: HashSet<String>,
    numbers_as_string: bool,
}

impl AdditionalFieldsBuilder {
    pub fn add(&mut self, name: impl Into<String>, value: FieldValue) -> Result<(), FieldError> {
        let name = name.into();
        validate_field_name(&name)?;
        if self.seen.contains(&name) {
            return Err(FieldError::Duplicate(name));
        }
        let value = if self.numbers_as_string {
            value
        } else {
            value.promote_numeric()
        };
        self.seen.insert(name.clone());
        self.fields.push((name, value));
        Ok(())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<Self, FieldError> {
        self.add(name, value.into())?;
        Ok(self)
    }

    pub fn build(self) -> AdditionalFields {
        AdditionalFields {
            fields: self.fields,
        }
    }
}
