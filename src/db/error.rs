use super::{
    CHAPTER_NUMBER_KEY, FAVORITE_KEY, READING_HISTORY_KEY, USER_EMAIL_KEY, USER_USERNAME_KEY,
};

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database error")]
    DatabaseError(sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Unique constraint `{0}` violated")]
    UniqueViolation(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(database_error) = &error {
            if database_error.is_unique_violation() {
                let constraint = database_error.constraint().unwrap_or_default().to_string();
                return DatabaseError::UniqueViolation(constraint);
            }
        }

        DatabaseError::DatabaseError(error)
    }
}

/// Client-facing message for a violated unique constraint.
pub fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        USER_USERNAME_KEY => "A user with this username already exists",
        USER_EMAIL_KEY => "A user with this email already exists",
        CHAPTER_NUMBER_KEY => "A chapter with this number already exists for this manga",
        FAVORITE_KEY => "Manga is already in favorites",
        READING_HISTORY_KEY => "Reading progress already recorded",
        _ => "Resource already exists",
    }
}
