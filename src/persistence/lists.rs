use anyhow::Context;
use chrono::DateTime;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::CampaignDefaults;
use crate::domain::Contact;
use crate::domain::EmailAddress;
use crate::domain::ListFields;
use crate::domain::MailChimpEntity;
use crate::domain::MailChimpList;

#[derive(sqlx::FromRow)]
struct ListRecord {
    list_id: Uuid,
    mail_chimp_id: Option<String>,
    name: String,
    permission_reminder: String,
    email_type_option: bool,
    use_archive_bar: Option<bool>,
    visibility: Option<String>,
    notify_on_subscribe: Option<String>,
    notify_on_unsubscribe: Option<String>,
    contact: Json<Contact>,
    campaign_defaults: Json<CampaignDefaults>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_optional_email(email: Option<String>) -> Result<Option<EmailAddress>, anyhow::Error> {
    email
        .map(EmailAddress::parse)
        .transpose()
        .map_err(anyhow::Error::msg)
}

impl TryFrom<ListRecord> for MailChimpList {
    type Error = anyhow::Error;
    fn try_from(r: ListRecord) -> Result<Self, Self::Error> {
        let fields = ListFields {
            name: r.name,
            contact: r.contact.0,
            permission_reminder: r.permission_reminder,
            use_archive_bar: r.use_archive_bar,
            campaign_defaults: r.campaign_defaults.0,
            notify_on_subscribe: parse_optional_email(r.notify_on_subscribe)?,
            notify_on_unsubscribe: parse_optional_email(r.notify_on_unsubscribe)?,
            email_type_option: r.email_type_option,
            visibility: r.visibility,
        };
        Ok(MailChimpList::restore(
            r.list_id,
            r.mail_chimp_id,
            r.created_at,
            r.updated_at,
            fields,
        ))
    }
}

#[tracing::instrument(name = "Fetching list from db", skip(pool))]
pub async fn find_list(
    pool: &PgPool,
    list_id: Uuid,
) -> Result<Option<MailChimpList>, anyhow::Error> {
    let record = sqlx::query_as::<_, ListRecord>(
        r#"
        SELECT list_id, mail_chimp_id, name, permission_reminder, email_type_option,
            use_archive_bar, visibility, notify_on_subscribe, notify_on_unsubscribe,
            contact, campaign_defaults, created_at, updated_at
        FROM mail_chimp_lists
        WHERE list_id = $1
        "#,
    )
    .bind(list_id)
    .fetch_optional(pool)
    .await
    .context("Failed to query mail_chimp_lists")?;

    record.map(MailChimpList::try_from).transpose()
}

#[tracing::instrument(
    name = "INSERTing list into db",
    skip(pool, list),
    fields(list_id = %list.list_id())
)]
pub async fn insert_list(
    pool: &PgPool,
    list: &MailChimpList,
) -> Result<(), anyhow::Error> {
    let f = &list.fields;
    sqlx::query(
        r#"
        INSERT INTO mail_chimp_lists (
            list_id, mail_chimp_id, name, permission_reminder, email_type_option,
            use_archive_bar, visibility, notify_on_subscribe, notify_on_unsubscribe,
            contact, campaign_defaults, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(list.list_id())
    .bind(list.mail_chimp_id())
    .bind(f.name.as_str())
    .bind(f.permission_reminder.as_str())
    .bind(f.email_type_option)
    .bind(f.use_archive_bar)
    .bind(f.visibility.as_deref())
    .bind(f.notify_on_subscribe.as_ref().map(EmailAddress::as_str))
    .bind(f.notify_on_unsubscribe.as_ref().map(EmailAddress::as_str))
    .bind(Json(&f.contact))
    .bind(Json(&f.campaign_defaults))
    .bind(list.created_at())
    .bind(list.updated_at())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("bad query: {e:?}");
        e
    })
    .context("Failed to insert list")?;
    Ok(())
}

#[tracing::instrument(
    name = "UPDATEing list in db",
    skip(pool, list),
    fields(list_id = %list.list_id())
)]
pub async fn update_list(
    pool: &PgPool,
    list: &MailChimpList,
) -> Result<(), anyhow::Error> {
    let f = &list.fields;
    sqlx::query(
        r#"
        UPDATE mail_chimp_lists SET
            name = $2,
            permission_reminder = $3,
            email_type_option = $4,
            use_archive_bar = $5,
            visibility = $6,
            notify_on_subscribe = $7,
            notify_on_unsubscribe = $8,
            contact = $9,
            campaign_defaults = $10,
            updated_at = $11
        WHERE list_id = $1
        "#,
    )
    .bind(list.list_id())
    .bind(f.name.as_str())
    .bind(f.permission_reminder.as_str())
    .bind(f.email_type_option)
    .bind(f.use_archive_bar)
    .bind(f.visibility.as_deref())
    .bind(f.notify_on_subscribe.as_ref().map(EmailAddress::as_str))
    .bind(f.notify_on_unsubscribe.as_ref().map(EmailAddress::as_str))
    .bind(Json(&f.contact))
    .bind(Json(&f.campaign_defaults))
    .bind(list.updated_at())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("bad query: {e:?}");
        e
    })
    .context("Failed to update list")?;
    Ok(())
}

/// Members of the list are removed with it (`ON DELETE CASCADE`).
#[tracing::instrument(name = "DELETEing list from db", skip(pool))]
pub async fn delete_list(
    pool: &PgPool,
    list_id: Uuid,
) -> Result<(), anyhow::Error> {
    sqlx::query("DELETE FROM mail_chimp_lists WHERE list_id = $1")
        .bind(list_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("bad query: {e:?}");
            e
        })
        .context("Failed to delete list")?;
    Ok(())
}
