use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use uuid::Uuid;

use super::EmailAddress;
use super::EmailType;
use super::FieldName;
use super::MailChimpEntity;
use super::MemberStatus;
use crate::validation::Kind;
use crate::validation::Rule;

/// Geolocation of a subscriber. Unset coordinates are left out of the JSON;
/// set ones are passed on exactly as submitted (`151` stays an integer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Number>,
}

/// Everything a client may set on a list member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberFields {
    pub email_address: EmailAddress,
    #[serde(default)]
    pub email_type: Option<EmailType>,
    pub status: MemberStatus,
    #[serde(default)]
    pub merge_fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub interests: Option<Map<String, Value>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub vip: Option<bool>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub ip_signup: Option<String>,
    #[serde(default)]
    pub timestamp_signup: Option<String>,
    #[serde(default)]
    pub ip_opt: Option<String>,
    #[serde(default)]
    pub timestamp_opt: Option<String>,
}

/// A subscriber of a single list.
///
/// `id` and `unique_email_id` are assigned by MailChimp on creation; until
/// then the member only exists locally (in memory).
#[derive(Debug, Clone, PartialEq)]
pub struct ListMember {
    local_id: Uuid,
    id: Option<String>,
    unique_email_id: Option<String>,
    /// MailChimp id of the owning list (not its local id)
    list_id: String,
    pub fields: MemberFields,
}

const LOCATION_RULES: &[Rule] = &[
    Rule::nullable("latitude", Kind::Number),
    Rule::nullable("longitude", Kind::Number),
];

impl ListMember {
    /// A member that has not been pushed to MailChimp yet.
    pub fn new(
        list_id: String,
        fields: MemberFields,
    ) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            id: None,
            unique_email_id: None,
            list_id,
            fields,
        }
    }

    /// Rebuild a member read back from the store.
    pub fn restore(
        local_id: Uuid,
        id: Option<String>,
        unique_email_id: Option<String>,
        list_id: String,
        fields: MemberFields,
    ) -> Self {
        Self {
            local_id,
            id,
            unique_email_id,
            list_id,
            fields,
        }
    }

    pub fn local_id(&self) -> Uuid { self.local_id }

    pub fn list_id(&self) -> &str { &self.list_id }

    pub fn unique_email_id(&self) -> Option<&str> { self.unique_email_id.as_deref() }

    /// Record the identifiers MailChimp assigned on creation. These can only
    /// be set once.
    pub fn set_mail_chimp_ids(
        &mut self,
        id: String,
        unique_email_id: String,
    ) -> Result<(), anyhow::Error> {
        if self.id.is_some() || self.unique_email_id.is_some() {
            anyhow::bail!(
                "ListMember[{}] already has MailChimp ids assigned",
                self.local_id
            );
        }
        self.id = Some(id);
        self.unique_email_id = Some(unique_email_id);
        Ok(())
    }
}

impl MailChimpEntity for ListMember {
    type Fields = MemberFields;

    const FIELDS: &'static [FieldName] = &[
        FieldName::local("local_id"),
        FieldName::local("id"),
        FieldName::local("unique_email_id"),
        FieldName::local("list_id"),
        FieldName::synced("email_address"),
        FieldName::synced("email_type"),
        FieldName::synced("status"),
        FieldName::synced("merge_fields"),
        FieldName::synced("interests"),
        FieldName::synced("language"),
        FieldName::synced("vip"),
        FieldName::synced("location"),
        FieldName::synced("ip_signup"),
        FieldName::synced("timestamp_signup"),
        FieldName::synced("ip_opt"),
        FieldName::synced("timestamp_opt"),
    ];

    const RULES: &'static [Rule] = &[
        Rule::required("email_address", Kind::Email),
        Rule::nullable("email_type", Kind::String).one_of(EmailType::ALL),
        Rule::required("status", Kind::String).one_of(MemberStatus::ALL),
        Rule::nullable("merge_fields", Kind::Object),
        Rule::nullable("interests", Kind::Object),
        Rule::nullable("language", Kind::String),
        Rule::nullable("vip", Kind::Boolean),
        Rule::nullable("location", Kind::Object).nested(LOCATION_RULES),
        Rule::nullable("ip_signup", Kind::String),
        Rule::nullable("timestamp_signup", Kind::String),
        Rule::nullable("ip_opt", Kind::String),
        Rule::nullable("timestamp_opt", Kind::String),
    ];

    fn values(&self) -> Vec<Value> {
        let f = &self.fields;
        vec![
            json!(self.local_id),
            json!(self.id),
            json!(self.unique_email_id),
            json!(self.list_id),
            json!(f.email_address),
            json!(f.email_type),
            json!(f.status),
            json!(f.merge_fields),
            json!(f.interests),
            json!(f.language),
            json!(f.vip),
            json!(f.location),
            json!(f.ip_signup),
            json!(f.timestamp_signup),
            json!(f.ip_opt),
            json!(f.timestamp_opt),
        ]
    }

    fn mail_chimp_id(&self) -> Option<&str> { self.id.as_deref() }

    fn fill(
        &mut self,
        fields: MemberFields,
    ) {
        self.fields = fields;
    }
}
