//! Declarative field validation.
//!
//! Each entity kind owns a static table of [`Rule`]s; [`validate`] checks a
//! submitted JSON object against such a table and collects every violation,
//! keyed by field name (nested fields are keyed as `parent.child`).
//!
//! Validation never touches storage or the network.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use validator::ValidateEmail;

/// The JSON type a field must have when it is present (and not null).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    /// A string that parses as an email address
    Email,
    Boolean,
    /// Any JSON number (integers included)
    Number,
    Object,
}

impl Kind {
    /// Returns the tail of the violation message if `value` is of the wrong
    /// kind.
    fn check(
        self,
        value: &Value,
    ) -> Option<&'static str> {
        let ok = match self {
            Kind::String => value.is_string(),
            Kind::Email => value
                .as_str()
                .map(|s| ValidateEmail::validate_email(&s.to_string()))
                .unwrap_or(false),
            Kind::Boolean => value.is_boolean(),
            Kind::Number => value.is_number(),
            Kind::Object => value.is_object(),
        };
        match ok {
            true => None,
            false => Some(match self {
                Kind::String => "must be a string.",
                Kind::Email => "must be a valid email address.",
                Kind::Boolean => "field must be true or false.",
                Kind::Number => "must be a number.",
                Kind::Object => "must be an object.",
            }),
        }
    }
}

/// A single field constraint. Build with `Rule::required` /
/// `Rule::nullable`, then optionally restrict with `one_of` or `nested`.
#[derive(Debug)]
pub struct Rule {
    pub field: &'static str,
    /// Required fields must be present, not null, and not an empty string.
    /// Non-required fields may be absent, null or empty.
    pub required: bool,
    pub kind: Kind,
    /// Allowed values; empty means unrestricted. Only meaningful for string
    /// kinds.
    pub one_of: &'static [&'static str],
    /// Sub-rules applied to the fields of an object value.
    pub nested: &'static [Rule],
}

impl Rule {
    pub const fn required(
        field: &'static str,
        kind: Kind,
    ) -> Self {
        Self {
            field,
            required: true,
            kind,
            one_of: &[],
            nested: &[],
        }
    }

    pub const fn nullable(
        field: &'static str,
        kind: Kind,
    ) -> Self {
        Self {
            field,
            required: false,
            kind,
            one_of: &[],
            nested: &[],
        }
    }

    pub const fn one_of(
        self,
        values: &'static [&'static str],
    ) -> Self {
        Self {
            one_of: values,
            ..self
        }
    }

    pub const fn nested(
        self,
        rules: &'static [Rule],
    ) -> Self {
        Self {
            nested: rules,
            ..self
        }
    }
}

/// Per-field violation messages. Serialized as a plain JSON object, e.g.
/// `{"status": ["The selected status is invalid."]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }
}

impl Display for ValidationErrors {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check `data` against `rules`, collecting every violation.
pub fn validate(
    data: &Map<String, Value>,
    rules: &[Rule],
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check(data, rules, None, &mut errors);
    match errors.is_empty() {
        true => Ok(()),
        false => Err(errors),
    }
}

/// Replace empty strings in non-required fields (nested ones included) with
/// `null`, so that a blank optional field is stored and sent as unset.
pub fn clear_blanks(
    data: &mut Map<String, Value>,
    rules: &[Rule],
) {
    for rule in rules {
        match data.get_mut(rule.field) {
            Some(value) if value.as_str() == Some("") && !rule.required => {
                *value = Value::Null;
            }
            Some(Value::Object(inner)) => clear_blanks(inner, rule.nested),
            _ => {}
        }
    }
}

fn check(
    data: &Map<String, Value>,
    rules: &[Rule],
    prefix: Option<&str>,
    errors: &mut ValidationErrors,
) {
    for rule in rules {
        let key = match prefix {
            Some(p) => format!("{p}.{}", rule.field),
            None => rule.field.to_string(),
        };
        // `email_address` -> `email address`
        let label = key.replace('_', " ");

        let value = match data.get(rule.field) {
            None | Some(Value::Null) => None,
            // blank counts as absent: missing if required, skipped otherwise
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };

        let Some(value) = value else {
            if rule.required {
                errors.add(&key, format!("The {label} field is required."));
            }
            continue;
        };

        if let Some(msg) = rule.kind.check(value) {
            errors.add(&key, format!("The {label} {msg}"));
            continue;
        }

        if !rule.one_of.is_empty() {
            if let Some(s) = value.as_str() {
                if !rule.one_of.contains(&s) {
                    errors.add(&key, format!("The selected {label} is invalid."));
                }
            }
        }

        if let Value::Object(inner) = value {
            check(inner, rule.nested, Some(&key), errors);
        }
    }
}
