//! Field access over a parsed YAML mapping with precise error reporting

use serde_yaml::{Mapping, Sequence, Value};

use super::LoadError;

/// A YAML mapping plus where it sits in the document
pub(super) struct Fields<'a> {
    map: &'a Mapping,
    origin: &'a str,
    context: String,
}

impl<'a> Fields<'a> {
    pub(super) fn new(
        value: &'a Value,
        origin: &'a str,
        context: impl Into<String>,
    ) -> Result<Self, LoadError> {
        let context = context.into();
        match value {
            Value::Mapping(map) => Ok(Self {
                map,
                origin,
                context,
            }),
            other => Err(parse_error(
                origin,
                &context,
                format!("expected a mapping, found {}", kind(other)),
            )),
        }
    }

    pub(super) fn context(&self) -> &str {
        &self.context
    }

    fn lookup(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .find_map(|key| self.map.get(*key))
            .filter(|value| !value.is_null())
    }

    fn missing(&self, key: &str) -> LoadError {
        LoadError::MissingKey {
            origin: self.origin.to_string(),
            key: key.to_string(),
            context: self.context.clone(),
        }
    }

    fn invalid(&self, key: &str, message: impl Into<String>) -> LoadError {
        parse_error(self.origin, &format!("{}.{key}", self.context), message.into())
    }

    /// Required value; the first key is the canonical name, the rest aliases
    pub(super) fn required(&self, keys: &[&str]) -> Result<&'a Value, LoadError> {
        self.lookup(keys).ok_or_else(|| self.missing(keys[0]))
    }

    /// Required scalar rendered as text
    pub(super) fn string(&self, keys: &[&str]) -> Result<String, LoadError> {
        let value = self.required(keys)?;
        scalar_text(value).ok_or_else(|| {
            self.invalid(keys[0], format!("expected a string, found {}", kind(value)))
        })
    }

    /// Optional scalar rendered as text; blank or null reads as absent
    pub(super) fn optional_string(&self, key: &str) -> Result<Option<String>, LoadError> {
        match self.lookup(&[key]) {
            None => Ok(None),
            Some(value) => scalar_text(value)
                .map(|text| Some(text).filter(|t| !t.trim().is_empty()))
                .ok_or_else(|| {
                    self.invalid(key, format!("expected a string, found {}", kind(value)))
                }),
        }
    }

    /// Required whole number of seconds
    pub(super) fn seconds(&self, key: &str) -> Result<u64, LoadError> {
        let value = self.required(&[key])?;
        value.as_u64().ok_or_else(|| {
            self.invalid(
                key,
                format!("expected a non-negative integer, found {}", kind(value)),
            )
        })
    }

    /// Required sequence
    pub(super) fn sequence(&self, key: &str) -> Result<&'a Sequence, LoadError> {
        let value = self.required(&[key])?;
        value.as_sequence().ok_or_else(|| {
            self.invalid(key, format!("expected a list, found {}", kind(value)))
        })
    }
}

pub(super) fn parse_error(origin: &str, context: &str, message: String) -> LoadError {
    LoadError::Parse {
        origin: origin.to_string(),
        context: context.to_string(),
        message,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(super) const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
