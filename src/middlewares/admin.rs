use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::error::AuthError,
    db::user::get_user_role,
    error::Error,
    model::{Identity, Role},
    state::SharedAppState,
};

/// Must run after [`super::jwt_auth_middleware`]. Token claims are checked
/// first, then the stored role, so a demoted admin loses access immediately.
#[tracing::instrument(name = "[MIDDLEWARE] admin", skip_all)]
pub async fn admin_middleware(
    State(app_state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let identity = req
        .extensions()
        .get::<Arc<Identity>>()
        .cloned()
        .ok_or(Error::Auth(AuthError::Unauthenticated))?;

    if !identity.is_admin() {
        return Err(Error::Forbidden);
    }

    match get_user_role(&app_state.pool, identity.id).await? {
        Some(Role::Admin) => Ok(next.run(req).await),
        Some(Role::User) => {
            tracing::info!(user_id = identity.id, "Admin claim no longer matches stored role");
            Err(Error::Forbidden)
        }
        None => Err(Error::Auth(AuthError::Unauthenticated)),
    }
}
