use actix_web::web;
use actix_web::HttpResponse;
use anyhow::Context;
use serde_json::Map;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::ApiError;
use crate::domain::merge_submission;
use crate::domain::parse_fields;
use crate::domain::MailChimpEntity;
use crate::domain::MailChimpList;
use crate::mailchimp_client::MailChimpClient;
use crate::persistence;

/// Look up a list by the local id given in the url. Ids that are not even
/// uuids cannot exist, so they are reported as not found too.
pub(super) async fn resolve_list(
    pool: &PgPool,
    list_id: &str,
) -> Result<MailChimpList, ApiError> {
    let not_found = || ApiError::NotFound(format!("MailChimpList[{list_id}]"));
    let id = Uuid::parse_str(list_id).map_err(|_| not_found())?;
    persistence::find_list(pool, id)
        .await?
        .ok_or_else(not_found)
}

/// Lists only reach the db after MailChimp assigned them an id, so a missing
/// id means the row was tampered with.
pub(super) fn remote_list_id(list: &MailChimpList) -> Result<&str, ApiError> {
    let id = list
        .mail_chimp_id()
        .with_context(|| format!("MailChimpList[{}] has no MailChimp id", list.list_id()))?;
    Ok(id)
}

/// `POST /lists`
///
/// Validate, create the list in MailChimp, then save it with the id
/// MailChimp assigned.
///
/// # Request example
///
/// ```sh
///     curl -X POST -H 'Content-Type: application/json' \
///         --data @list.json http://127.0.0.1:8000/lists
/// ```
#[tracing::instrument(
    name = "Creating list",
    skip(body, pool, mailchimp),
    fields(list_id = tracing::field::Empty)
)]
pub async fn create_list(
    body: web::Json<Map<String, Value>>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let fields =
        parse_fields::<MailChimpList>(body.into_inner()).map_err(ApiError::ValidationFailed)?;
    let mut list = MailChimpList::new(fields);
    tracing::Span::current().record("list_id", tracing::field::display(list.list_id()));

    let created = mailchimp
        .create_list(&list.to_mail_chimp_array())
        .await?;
    list.set_mail_chimp_id(created.id)?;

    persistence::insert_list(&pool, &list)
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::Created().json(list.to_array()))
}

/// `GET /lists/{list_id}`
#[tracing::instrument(name = "Showing list", skip(pool))]
pub async fn show_list(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path).await?;
    Ok(HttpResponse::Ok().json(list.to_array()))
}

/// `PATCH /lists/{list_id}`
///
/// Submitted fields are merged onto the stored ones; the result must pass
/// validation as a whole.
#[tracing::instrument(name = "Updating list", skip(body, pool, mailchimp))]
pub async fn update_list(
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let mut list = resolve_list(&pool, &path).await?;

    let merged = merge_submission(&list, body.into_inner());
    let fields = parse_fields::<MailChimpList>(merged).map_err(ApiError::ValidationFailed)?;
    list.fill(fields);

    mailchimp
        .update_list(remote_list_id(&list)?, &list.to_mail_chimp_array())
        .await?;

    persistence::update_list(&pool, &list)
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::Ok().json(list.to_array()))
}

/// `DELETE /lists/{list_id}`
///
/// Deletes from MailChimp first, then locally (members included). If the
/// local delete fails, the list is gone remotely but still present here;
/// nothing is rolled back.
#[tracing::instrument(name = "Removing list", skip(pool, mailchimp))]
pub async fn remove_list(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
    mailchimp: web::Data<MailChimpClient>,
) -> Result<HttpResponse, ApiError> {
    let list = resolve_list(&pool, &path).await?;

    mailchimp.delete_list(remote_list_id(&list)?).await?;

    persistence::delete_list(&pool, list.list_id())
        .await
        .map_err(ApiError::PersistenceError)?;

    Ok(HttpResponse::NoContent().finish())
}
