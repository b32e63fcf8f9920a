use actix_web::web;
use actix_web::HttpResponse;
use anyhow::Context;
use serde_json::Map;
use serde_json::Value;
use sqlx::PgPool;
use tracing::field::display;
use tracing::Span;
use uuid::Uuid;

use super::lists::remote_list_id;
use super::lists::resolve_list;
use super::ApiError;
use crate::domain::merge_submission;
use crate::domain::parse_fields;
use crate::domain::ListMember;
use crate::domain::MailChimpEntity;
use crate::mailchimp_client::MailChimpClient;
use crate::persistence;

#[derive(serde::Deserialize, Debug)]
pub struct MemberPath {
    list_id: String,
    member_id: String,
}

/// Find a member of the given list (by MailChimp list id). Members of other
/// lists are not found.
async fn resolve_member(
    pool: &PgPool,
    list_id: &str,
    member_id: &str,
) -> Result<ListMember, ApiError> {
    let not_found = || ApiError::NotFound(format!("MailChimpListMember[{member_id}]"));
    let id = Uuid::parse_str(member_id).map_err(|_| not_found())?;
    persistence::find_member(pool, list_id, id)
        .await?
        .ok_or_else(not_found)
}

fn remote_member_id(member: &ListMember) -> Result<&str, ApiError> {
    let id = member.mail_chimp_id().with_context(|| {
        format!(
            "MailChimpListMember[{}] has no MailChimp id",
            member.local_id()
        )
    })?;
    Ok(id)
}

/// `POST /lists/{list_id}/members`
///
/// The member is only saved once MailChimp has accepted it, so a remote
/// failure leaves nothing behind locally.
#[tracing::instrument(
    name = "Creating list member",
    skip(body, pool, mailchimp),
    fields(local_id = tracing::field::Empty)
)]
pub async fn create_member(
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path).await?;
    let list_id = remote_list_id(&list)?;

    let fields =
        parse_fields::<ListMember>(body.into_inner()).map_err(ApiError::ValidationFailed)?;
    let mut member = ListMember::new(list_id.to_string(), fields);
    Span::current().record("local_id", display(member.local_id()));

    let created = mailchimp
        .create_member(list_id, &member.to_mail_chimp_array())
        .await?;
    member.set_mail_chimp_ids(created.id, created.unique_email_id)?;

    persistence::insert_member(&pool, &member)
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::Created().json(member.to_array()))
}

/// `GET /lists/{list_id}/members/{member_id}`
#[tracing::instrument(name = "Showing list member", skip(pool))]
pub async fn show_member(
    path: web::Path<MemberPath>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path.list_id).await?;
    let member = resolve_member(&pool, remote_list_id(&list)?, &path.member_id).await?;
    Ok(HttpResponse::Ok().json(member.to_array()))
}

/// `PATCH /lists/{list_id}/members/{member_id}`
///
/// Partial update: omitted fields keep their stored value, `null` clears
/// one. The local row is only touched once MailChimp accepted the change.
#[tracing::instrument(name = "Updating list member", skip(body, pool, mailchimp))]
pub async fn update_member(
    path: web::Path<MemberPath>,
    body: web::Json<Map<String, Value>>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path.list_id).await?;
    let list_id = remote_list_id(&list)?;
    let mut member = resolve_member(&pool, list_id, &path.member_id).await?;

    let merged = merge_submission(&member, body.into_inner());
    let fields = parse_fields::<ListMember>(merged).map_err(ApiError::ValidationFailed)?;
    member.fill(fields);

    mailchimp
        .update_member(
            list_id,
            remote_member_id(&member)?,
            &member.to_mail_chimp_array(),
        )
        .await?;

    persistence::update_member(&pool, &member)
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::Ok().json(member.to_array()))
}

/// `DELETE /lists/{list_id}/members/{member_id}`
///
/// Remote first, then local. A failed local delete after a successful remote
/// one is reported but not compensated.
#[tracing::instrument(name = "Removing list member", skip(pool, mailchimp))]
pub async fn remove_member(
    path: web::Path<MemberPath>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path.list_id).await?;
    let list_id = remote_list_id(&list)?;
    let member = resolve_member(&pool, list_id, &path.member_id).await?;

    mailchimp
        .delete_member(list_id, remote_member_id(&member)?)
        .await?;

    persistence::delete_member(&pool, member.local_id())
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::NoContent().finish())
}
