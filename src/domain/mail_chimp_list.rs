use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use uuid::Uuid;

use super::EmailAddress;
use super::FieldName;
use super::MailChimpEntity;
use crate::validation::Kind;
use crate::validation::Rule;

/// Postal contact shown in the footer of every campaign (required by
/// anti-spam law, hence required by MailChimp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub company: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDefaults {
    pub from_name: String,
    pub from_email: EmailAddress,
    pub subject: String,
    pub language: String,
}

/// Everything a client may set on a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListFields {
    pub name: String,
    pub contact: Contact,
    pub permission_reminder: String,
    #[serde(default)]
    pub use_archive_bar: Option<bool>,
    pub campaign_defaults: CampaignDefaults,
    #[serde(default)]
    pub notify_on_subscribe: Option<EmailAddress>,
    #[serde(default)]
    pub notify_on_unsubscribe: Option<EmailAddress>,
    pub email_type_option: bool,
    /// `pub` or `prv`
    #[serde(default)]
    pub visibility: Option<String>,
}

/// A mailing list; the parent of every `ListMember`.
#[derive(Debug, Clone, PartialEq)]
pub struct MailChimpList {
    list_id: Uuid,
    mail_chimp_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pub fields: ListFields,
}

const CONTACT_RULES: &[Rule] = &[
    Rule::required("company", Kind::String),
    Rule::required("address1", Kind::String),
    Rule::nullable("address2", Kind::String),
    Rule::required("city", Kind::String),
    Rule::required("state", Kind::String),
    Rule::required("zip", Kind::String),
    Rule::required("country", Kind::String),
    Rule::nullable("phone", Kind::String),
];

const CAMPAIGN_DEFAULTS_RULES: &[Rule] = &[
    Rule::required("from_name", Kind::String),
    Rule::required("from_email", Kind::Email),
    Rule::required("subject", Kind::String),
    Rule::required("language", Kind::String),
];

impl MailChimpList {
    /// A list that has not been pushed to MailChimp yet.
    pub fn new(fields: ListFields) -> Self {
        let now = Utc::now();
        Self {
            list_id: Uuid::new_v4(),
            mail_chimp_id: None,
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    /// Rebuild a list read back from the store.
    pub fn restore(
        list_id: Uuid,
        mail_chimp_id: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        fields: ListFields,
    ) -> Self {
        Self {
            list_id,
            mail_chimp_id,
            created_at,
            updated_at,
            fields,
        }
    }

    pub fn list_id(&self) -> Uuid { self.list_id }

    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Record the id MailChimp assigned on creation. Can only be set once.
    pub fn set_mail_chimp_id(
        &mut self,
        id: String,
    ) -> Result<(), anyhow::Error> {
        if self.mail_chimp_id.is_some() {
            anyhow::bail!(
                "MailChimpList[{}] already has a MailChimp id assigned",
                self.list_id
            );
        }
        self.mail_chimp_id = Some(id);
        Ok(())
    }
}

impl MailChimpEntity for MailChimpList {
    type Fields = ListFields;

    const FIELDS: &'static [FieldName] = &[
        FieldName::local("list_id"),
        FieldName::local("mail_chimp_id"),
        FieldName::synced("name"),
        FieldName::synced("contact"),
        FieldName::synced("permission_reminder"),
        FieldName::synced("use_archive_bar"),
        FieldName::synced("campaign_defaults"),
        FieldName::synced("notify_on_subscribe"),
        FieldName::synced("notify_on_unsubscribe"),
        FieldName::synced("email_type_option"),
        FieldName::synced("visibility"),
        FieldName::local("created_at"),
        FieldName::local("updated_at"),
    ];

    const RULES: &'static [Rule] = &[
        Rule::required("name", Kind::String),
        Rule::required("contact", Kind::Object).nested(CONTACT_RULES),
        Rule::required("permission_reminder", Kind::String),
        Rule::nullable("use_archive_bar", Kind::Boolean),
        Rule::required("campaign_defaults", Kind::Object).nested(CAMPAIGN_DEFAULTS_RULES),
        Rule::nullable("notify_on_subscribe", Kind::Email),
        Rule::nullable("notify_on_unsubscribe", Kind::Email),
        Rule::required("email_type_option", Kind::Boolean),
        Rule::nullable("visibility", Kind::String).one_of(&["pub", "prv"]),
    ];

    fn values(&self) -> Vec<Value> {
        let f = &self.fields;
        vec![
            json!(self.list_id),
            json!(self.mail_chimp_id),
            json!(f.name),
            json!(f.contact),
            json!(f.permission_reminder),
            json!(f.use_archive_bar),
            json!(f.campaign_defaults),
            json!(f.notify_on_subscribe),
            json!(f.notify_on_unsubscribe),
            json!(f.email_type_option),
            json!(f.visibility),
            json!(self.created_at),
            json!(self.updated_at),
        ]
    }

    fn mail_chimp_id(&self) -> Option<&str> { self.mail_chimp_id.as_deref() }

    fn fill(
        &mut self,
        fields: ListFields,
    ) {
        self.fields = fields;
        self.updated_at = Utc::now();
    }
}
