use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{decode_jwt, error::AuthError},
    error::Error,
    state::SharedAppState,
};

/// Returns the token of an `Authorization: Bearer <token>` header. The scheme is case-insensitive.
pub fn bearer_token(value: &str) -> Option<&str> {
    let mut header = value.split_whitespace();
    let (scheme, token) = (header.next()?, header.next()?);

    if !scheme.eq_ignore_ascii_case("bearer") || header.next().is_some() {
        return None;
    }

    Some(token)
}

/// Verifies the bearer token and attaches the embedded identity to the request.
#[tracing::instrument(name = "[MIDDLEWARE] jwt auth", skip_all, fields(user_id))]
pub async fn jwt_auth_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let auth_header = match req.headers().get(axum::http::header::AUTHORIZATION) {
        Some(header) => header
            .to_str()
            .map_err(|_| Error::Auth(AuthError::Unauthenticated))?,
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    let token = bearer_token(auth_header).ok_or(Error::Auth(AuthError::Unauthenticated))?;

    let token_data = decode_jwt(token, &app_state.config.jwt)?;
    let identity = Arc::new(token_data.claims.user);

    tracing::Span::current().record("user_id", identity.id);
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
