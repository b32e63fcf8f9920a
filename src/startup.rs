use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::error::InternalError;
use actix_web::error::JsonPayloadError;
use actix_web::web;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::mailchimp_client::MailChimpClient;
use crate::routes::create_list;
use crate::routes::create_member;
use crate::routes::health_check;
use crate::routes::remove_list;
use crate::routes::remove_member;
use crate::routes::show_list;
use crate::routes::show_member;
use crate::routes::update_list;
use crate::routes::update_member;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener (port 0 means a random port), set up the db pool and
    /// MailChimp client, and build the `Server`. Nothing is served until
    /// `run_until_stopped` is awaited.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&cfg.database);
        let mailchimp = cfg.mailchimp.client()?;

        let server = run(listener, pool, mailchimp)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The pool only connects on first use, so `/health_check` works without a db.
pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(db_cfg.connection())
}

/// Malformed JSON bodies (or a non-object body) are rejected before reaching
/// any handler, in the same `{"message": ...}` shape as other errors.
fn json_error_handler(
    err: JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
    InternalError::from_response(err, response).into()
}

/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    mailchimp: MailChimpClient,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`; every worker gets a clone of the same pool/client
    let pool = web::Data::new(pool);
    let mailchimp = web::Data::new(mailchimp);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/lists")
                    .route("", web::post().to(create_list))
                    .route("/{list_id}", web::get().to(show_list))
                    .route("/{list_id}", web::patch().to(update_list))
                    .route("/{list_id}", web::delete().to(remove_list))
                    .route("/{list_id}/members", web::post().to(create_member))
                    .route("/{list_id}/members/{member_id}", web::get().to(show_member))
                    .route(
                        "/{list_id}/members/{member_id}",
                        web::patch().to(update_member),
                    )
                    .route(
                        "/{list_id}/members/{member_id}",
                        web::delete().to(remove_member),
                    ),
            )
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(pool.clone())
            .app_data(mailchimp.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
