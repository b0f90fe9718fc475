#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth token is missing")]
    Unauthenticated,
    #[error("Invalid token")]
    InvalidToken(jsonwebtoken::errors::Error),
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Password error")]
    PasswordError(argon2::password_hash::Error),
    #[error("Incorrect credential")]
    IncorrectCredential,
    #[error("Incorrect current password")]
    IncorrectPassword,
}
