use anyhow::Context;
use validator::Validate;

use crate::error::Error;

pub mod auth;
pub mod chapters;
pub mod health;
pub mod manga;
pub mod users;

#[derive(serde::Serialize, serde::Deserialize, Debug, Validate)]
pub struct UrlPath {
    #[validate(range(min = 1, message = "Id must be a positive integer"))]
    pub id: i64,
}

/// Snapshot of a value for an audit record's `details`.
pub fn audit_details<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value)
        .context("serialize audit details")
        .map_err(Error::Other)
}
