use axum::Json;
use chrono::{DateTime, Utc};

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Liveness check. Does not touch the database and is not wrapped in the envelope.
#[tracing::instrument(name = "[GET] health", skip_all)]
pub async fn index() -> Json<Health> {
    Json(Health {
        status: "OK".into(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
