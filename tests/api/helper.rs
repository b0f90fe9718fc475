use manga_reader::{config::Config, startup::Application};

pub struct TestApp {
    pub address: String,
}

/// Runs the real server on a random port. The pool connects lazily, so routes
/// that never touch the database work without Postgres.
pub async fn spawn_app() -> TestApp {
    let config = {
        let mut c = Config::new().expect("Failed to read configuration");
        c.application.port = 0;
        c.application.host = "127.0.0.1".into();
        c.application.run_migration = false;
        c
    };

    let application = Application::build(config)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    tokio::spawn(application.run_until_stopped());

    TestApp { address }
}
