use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Does not touch the db or MailChimp.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
