use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde_json::json;

use crate::mailchimp_client::MailChimpError;
use crate::validation::ValidationErrors;

mod health_check;
mod lists;
mod members;

pub use health_check::health_check;
pub use lists::create_list;
pub use lists::remove_list;
pub use lists::show_list;
pub use lists::update_list;
pub use members::create_member;
pub use members::remove_member;
pub use members::show_member;
pub use members::update_member;

/// Every way a list/member request can fail. Each variant maps to one status
/// code, and all of them share the body shape
/// `{"message": ..., "errors": {...}}` (`errors` only on validation failure).
#[derive(thiserror::Error)]
pub enum ApiError {
    /// e.g. `MailChimpList[<id>] not found`
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid data given")]
    ValidationFailed(ValidationErrors),

    /// Displays the provider's message verbatim
    #[error(transparent)]
    RemoteError(#[from] MailChimpError),

    /// The remote call (if any) already succeeded, so local and remote state
    /// may now disagree.
    #[error("Failed to save changes locally")]
    PersistenceError(#[source] anyhow::Error),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for ApiError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RemoteError(_) | Self::PersistenceError(_) | Self::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let body = match self {
            Self::ValidationFailed(errors) => json!({
                "message": self.to_string(),
                "errors": errors,
            }),
            _ => json!({ "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Print the error, then every `source` below it, one per line.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
