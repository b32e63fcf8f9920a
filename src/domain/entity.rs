use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::validation::clear_blanks;
use crate::validation::validate;
use crate::validation::Rule;
use crate::validation::ValidationErrors;

/// How a field is named locally (db columns, JSON responses) and, if it is
/// pushed to MailChimp at all, how the provider names it.
#[derive(Debug)]
pub struct FieldName {
    pub local: &'static str,
    /// `None` for fields owned by this service (local ids, timestamps) or
    /// assigned by the provider (remote ids); these are never sent.
    pub remote: Option<&'static str>,
}

impl FieldName {
    /// Local-only field
    pub const fn local(name: &'static str) -> Self {
        Self {
            local: name,
            remote: None,
        }
    }

    /// Field sent to the provider under the same name
    pub const fn synced(name: &'static str) -> Self {
        Self {
            local: name,
            remote: Some(name),
        }
    }
}

/// A record mirrored between MailChimp and the local store.
///
/// Implementors declare their field-name table (`FIELDS`) and validation rules
/// (`RULES`) statically; both JSON projections are derived from those.
pub trait MailChimpEntity {
    /// The user-writable part of the entity, parsed from a validated
    /// submission.
    type Fields: DeserializeOwned;

    const FIELDS: &'static [FieldName];
    const RULES: &'static [Rule];

    /// Field values, in the same order as `FIELDS`.
    fn values(&self) -> Vec<Value>;

    fn mail_chimp_id(&self) -> Option<&str>;

    /// Replace the writable fields.
    fn fill(
        &mut self,
        fields: Self::Fields,
    );

    /// Payload for the provider: remote names only, null values dropped.
    fn to_mail_chimp_array(&self) -> Map<String, Value> {
        Self::FIELDS
            .iter()
            .zip(self.values())
            .filter_map(|(name, value)| match (name.remote, value) {
                (None, _) | (_, Value::Null) => None,
                (Some(remote), value) => Some((remote.to_string(), value)),
            })
            .collect()
    }

    /// Local/response representation: every declared field, nulls included.
    fn to_array(&self) -> Map<String, Value> {
        Self::FIELDS
            .iter()
            .zip(self.values())
            .map(|(name, value)| (name.local.to_string(), value))
            .collect()
    }

    /// Writable fields that currently hold a value, under their local names.
    /// This is the base that a partial update is merged onto.
    fn to_submission(&self) -> Map<String, Value> {
        Self::FIELDS
            .iter()
            .zip(self.values())
            .filter_map(|(name, value)| match (name.remote, value) {
                (None, _) | (_, Value::Null) => None,
                (Some(_), value) => Some((name.local.to_string(), value)),
            })
            .collect()
    }
}

/// Validate `data` against `E::RULES`, then parse it into `E::Fields`.
///
/// Unknown keys are ignored, so identifiers can never be overwritten through a
/// submission. Blank optional fields are treated as unset.
pub fn parse_fields<E: MailChimpEntity>(
    mut data: Map<String, Value>
) -> Result<E::Fields, ValidationErrors> {
    clear_blanks(&mut data, E::RULES);
    validate(&data, E::RULES)?;
    serde_json::from_value(Value::Object(data)).map_err(|e| {
        // rules and field types disagree; report it the same way
        let mut errors = ValidationErrors::default();
        errors.add("body", e.to_string());
        errors
    })
}

/// Overlay `submitted` onto the current writable fields of `entity`. An
/// explicit `null` in `submitted` clears the field.
pub fn merge_submission<E: MailChimpEntity>(
    entity: &E,
    submitted: Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = entity.to_submission();
    merged.extend(submitted);
    merged
}
