use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use validator::ValidationErrors;

use crate::{
    auth::error::AuthError,
    db::error::{DatabaseError, conflict_message},
    response::{ApiResponse, FieldError},
};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error")]
    Database(DatabaseError),

    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not implemented")]
    NotImplemented(&'static str),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<DatabaseError> for Error {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Database(DatabaseError::DatabaseError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
            Error::Auth(AuthError::JwtError(_)) | Error::Auth(AuthError::PasswordError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::Validation(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn validation_details(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| FieldError {
                field: field.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string()),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));

    details
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let body = match self {
            Error::Database(database_error) => match database_error {
                DatabaseError::DatabaseError(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "Database Error");

                    ApiResponse::failure(INTERNAL_ERROR_MESSAGE)
                }
                DatabaseError::NotFound(entity) => ApiResponse::failure(format!("{} not found", entity)),
                DatabaseError::UniqueViolation(constraint) => {
                    tracing::info!(constraint = %constraint, "Unique constraint violated");

                    ApiResponse::failure(conflict_message(&constraint))
                }
            },
            Error::Auth(auth_error) => match auth_error {
                AuthError::Unauthenticated => {
                    ApiResponse::failure("Access denied. No token provided.")
                }
                AuthError::InvalidToken(error) => {
                    tracing::debug!(err.msg = %error, "Rejected token");

                    ApiResponse::failure("Invalid token.")
                }
                AuthError::IncorrectCredential => {
                    ApiResponse::failure("Invalid email/username or password")
                }
                AuthError::IncorrectPassword => {
                    ApiResponse::failure("Current password is incorrect")
                }
                AuthError::JwtError(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "JWT Error");

                    ApiResponse::failure(INTERNAL_ERROR_MESSAGE)
                }
                AuthError::PasswordError(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "Password Hash Error");

                    ApiResponse::failure(INTERNAL_ERROR_MESSAGE)
                }
            },
            Error::Validation(validation_error) => {
                tracing::info!(err.msg = %validation_error, "Validation Error");

                ApiResponse::failure("Validation failed: check the submitted fields")
                    .with_details(validation_details(&validation_error))
            }
            Error::InvalidInput(message) => {
                tracing::info!(err.msg = %message, "Invalid Input");

                ApiResponse::failure(message)
            }
            Error::Forbidden => ApiResponse::failure("Access denied. Admin privileges required."),
            Error::NotImplemented(message) => ApiResponse::failure(message),
            Error::Other(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Other Error");

                ApiResponse::failure(INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, body).into_response()
    }
}
