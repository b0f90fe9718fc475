use anyhow::Context;
use manga_reader::{
    config::Config,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("manga-reader".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let config = Config::new().context("Failed to read configuration.")?;

    let application = Application::build(config)
        .await
        .context("Failed creating server.")?;

    tracing::info!(
        "Started at http://{}:{}",
        application.host(),
        application.port()
    );

    application.run_until_stopped().await?;

    Ok(())
}
