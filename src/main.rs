use mailchimp_mirror::configuration::get_configuration;
use mailchimp_mirror::startup::Application;
use mailchimp_mirror::telemetry::get_subscriber;
use mailchimp_mirror::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // RUST_LOG overrides the default level
    let subscriber = get_subscriber("mailchimp-mirror", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let server = Application::build(cfg).await?;
    tracing::info!("Listening on port {}", server.get_port());
    server.run_until_stopped().await?;

    Ok(())
}
