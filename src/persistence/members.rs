use anyhow::Context;
use serde_json::Map;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::domain::EmailType;
use crate::domain::ListMember;
use crate::domain::Location;
use crate::domain::MailChimpEntity;
use crate::domain::MemberFields;
use crate::domain::MemberStatus;

#[derive(sqlx::FromRow)]
struct MemberRecord {
    local_id: Uuid,
    id: Option<String>,
    unique_email_id: Option<String>,
    list_id: String,
    email_address: String,
    email_type: Option<String>,
    status: String,
    merge_fields: Option<Json<Map<String, Value>>>,
    interests: Option<Json<Map<String, Value>>>,
    language: Option<String>,
    vip: Option<bool>,
    location: Option<Json<Location>>,
    ip_signup: Option<String>,
    timestamp_signup: Option<String>,
    ip_opt: Option<String>,
    timestamp_opt: Option<String>,
}

// rows were valid when written, but we cannot assume that they still are
impl TryFrom<MemberRecord> for ListMember {
    type Error = anyhow::Error;
    fn try_from(r: MemberRecord) -> Result<Self, Self::Error> {
        let fields = MemberFields {
            email_address: EmailAddress::parse(r.email_address).map_err(anyhow::Error::msg)?,
            email_type: r
                .email_type
                .map(EmailType::try_from)
                .transpose()
                .map_err(anyhow::Error::msg)?,
            status: MemberStatus::try_from(r.status).map_err(anyhow::Error::msg)?,
            merge_fields: r.merge_fields.map(|j| j.0),
            interests: r.interests.map(|j| j.0),
            language: r.language,
            vip: r.vip,
            location: r.location.map(|j| j.0),
            ip_signup: r.ip_signup,
            timestamp_signup: r.timestamp_signup,
            ip_opt: r.ip_opt,
            timestamp_opt: r.timestamp_opt,
        };
        Ok(ListMember::restore(
            r.local_id,
            r.id,
            r.unique_email_id,
            r.list_id,
            fields,
        ))
    }
}

/// Members are scoped to their list: a member of another list is reported as
/// absent.
#[tracing::instrument(name = "Fetching list member from db", skip(pool))]
pub async fn find_member(
    pool: &PgPool,
    list_id: &str,
    local_id: Uuid,
) -> Result<Option<ListMember>, anyhow::Error> {
    let record = sqlx::query_as::<_, MemberRecord>(
        r#"
        SELECT local_id, id, unique_email_id, list_id, email_address, email_type,
            status, merge_fields, interests, language, vip, location,
            ip_signup, timestamp_signup, ip_opt, timestamp_opt
        FROM mail_chimp_list_members
        WHERE local_id = $1 AND list_id = $2
        "#,
    )
    .bind(local_id)
    .bind(list_id)
    .fetch_optional(pool)
    .await
    .context("Failed to query mail_chimp_list_members")?;

    record.map(ListMember::try_from).transpose()
}

#[tracing::instrument(
    name = "INSERTing list member into db",
    skip(pool, member),
    fields(local_id = %member.local_id())
)]
pub async fn insert_member(
    pool: &PgPool,
    member: &ListMember,
) -> Result<(), anyhow::Error> {
    let f = &member.fields;
    sqlx::query(
        r#"
        INSERT INTO mail_chimp_list_members (
            local_id, id, unique_email_id, list_id, email_address, email_type,
            status, merge_fields, interests, language, vip, location,
            ip_signup, timestamp_signup, ip_opt, timestamp_opt
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(member.local_id())
    .bind(member.mail_chimp_id())
    .bind(member.unique_email_id())
    .bind(member.list_id())
    .bind(f.email_address.as_str())
    .bind(f.email_type.map(|t| t.as_str()))
    .bind(f.status.as_str())
    .bind(f.merge_fields.as_ref().map(Json))
    .bind(f.interests.as_ref().map(Json))
    .bind(f.language.as_deref())
    .bind(f.vip)
    .bind(f.location.as_ref().map(Json))
    .bind(f.ip_signup.as_deref())
    .bind(f.timestamp_signup.as_deref())
    .bind(f.ip_opt.as_deref())
    .bind(f.timestamp_opt.as_deref())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("bad query: {e:?}");
        e
    })
    .context("Failed to insert list member")?;
    Ok(())
}

/// Overwrites every writable column; identifiers and the owning list never
/// change.
#[tracing::instrument(
    name = "UPDATEing list member in db",
    skip(pool, member),
    fields(local_id = %member.local_id())
)]
pub async fn update_member(
    pool: &PgPool,
    member: &ListMember,
) -> Result<(), anyhow::Error> {
    let f = &member.fields;
    sqlx::query(
        r#"
        UPDATE mail_chimp_list_members SET
            email_address = $2,
            email_type = $3,
            status = $4,
            merge_fields = $5,
            interests = $6,
            language = $7,
            vip = $8,
            location = $9,
            ip_signup = $10,
            timestamp_signup = $11,
            ip_opt = $12,
            timestamp_opt = $13
        WHERE local_id = $1
        "#,
    )
    .bind(member.local_id())
    .bind(f.email_address.as_str())
    .bind(f.email_type.map(|t| t.as_str()))
    .bind(f.status.as_str())
    .bind(f.merge_fields.as_ref().map(Json))
    .bind(f.interests.as_ref().map(Json))
    .bind(f.language.as_deref())
    .bind(f.vip)
    .bind(f.location.as_ref().map(Json))
    .bind(f.ip_signup.as_deref())
    .bind(f.timestamp_signup.as_deref())
    .bind(f.ip_opt.as_deref())
    .bind(f.timestamp_opt.as_deref())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("bad query: {e:?}");
        e
    })
    .context("Failed to update list member")?;
    Ok(())
}

#[tracing::instrument(name = "DELETEing list member from db", skip(pool))]
pub async fn delete_member(
    pool: &PgPool,
    local_id: Uuid,
) -> Result<(), anyhow::Error> {
    sqlx::query("DELETE FROM mail_chimp_list_members WHERE local_id = $1")
        .bind(local_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("bad query: {e:?}");
            e
        })
        .context("Failed to delete list member")?;
    Ok(())
}
