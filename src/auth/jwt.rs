use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use secrecy::ExposeSecret;

use crate::{config::Jwt, error::Error, model::Identity};

use super::error::AuthError;

#[derive(serde::Deserialize, serde::Serialize)]
pub struct Claim {
    pub user: Identity,
    aud: String,
    iss: String,
    exp: usize,
    iat: usize,
}

pub fn encode_jwt(identity: &Identity, jwt: &Jwt) -> Result<String, Error> {
    encode_jwt_at(identity, jwt, Utc::now())
}

/// Issues a token as if it had been signed at `issued_at`.
pub fn encode_jwt_at(
    identity: &Identity,
    jwt: &Jwt,
    issued_at: DateTime<Utc>,
) -> Result<String, Error> {
    let expire = Duration::days(jwt.expiration_days);
    let exp = (issued_at + expire).timestamp().max(0) as usize;
    let iat = issued_at.timestamp().max(0) as usize;

    let claim = Claim {
        user: identity.clone(),
        aud: jwt.aud.clone(),
        iss: jwt.iss.clone(),
        iat,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claim,
        &EncodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| Error::Auth(AuthError::JwtError(e)))
}

pub fn decode_jwt(jwt_token: &str, jwt: &Jwt) -> Result<TokenData<Claim>, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&jwt.iss]);
    validation.set_audience(&[&jwt.aud]);

    decode::<Claim>(
        jwt_token,
        &DecodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|e| Error::Auth(AuthError::InvalidToken(e)))
}
