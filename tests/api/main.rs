use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use manga_reader::{
    auth::encode_jwt,
    config::Config,
    db::user::create_user,
    model::{Identity, Role},
    response::ApiResponse,
    routes::init_router,
    state::{AppState, MIGRATOR},
};
use serde::de::DeserializeOwned;
use sqlx::{Connection, Executor, PgConnection, PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;

mod client;
mod helper;

pub struct AppStateTest {
    pub app_state: AppState,
    database_name: Option<String>,
}

impl AppStateTest {
    /// With `with_database`, a throw-away database is created and migrated;
    /// otherwise the pool is lazy and never connects.
    pub async fn new(with_database: bool) -> Self {
        let mut config = Config::new().expect("Failed to read configuration");
        config.application.run_migration = false;

        if !with_database {
            let pool = PgPoolOptions::new().connect_lazy_with(config.database.with_db());

            return AppStateTest {
                app_state: AppState { pool, config },
                database_name: None,
            };
        }

        config.database.database_name = format!("test_{}", uuid::Uuid::new_v4().simple());

        let mut connection = PgConnection::connect_with(&config.database.without_db())
            .await
            .expect("Failed to connect to Postgres");
        connection
            .execute(format!(r#"CREATE DATABASE "{}";"#, config.database.database_name).as_str())
            .await
            .expect("Failed to create database");

        let pool = PgPool::connect_with(config.database.with_db())
            .await
            .expect("Failed to connect to Postgres");
        MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to migrate the database");

        let database_name = Some(config.database.database_name.clone());

        AppStateTest {
            app_state: AppState { pool, config },
            database_name,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.app_state.pool
    }

    pub async fn generate_response(&self, request: Request<Body>) -> Response {
        init_router(self.app_state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    pub fn generate_jwt(&self, identity: &Identity) -> String {
        encode_jwt(identity, &self.app_state.config.jwt).unwrap()
    }

    /// Registers a user with the given role and returns its identity and a session token.
    pub async fn generate_jwt_with_user(&self, role: Role) -> (Identity, String) {
        let (username, email) = fixtures::fake_username_and_email();

        let user = create_user(self.pool(), &username, &email, "password".into())
            .await
            .unwrap();

        if role == Role::Admin {
            set_role(self.pool(), user.id, Role::Admin).await;
        }

        let identity = Identity {
            id: user.id,
            username: user.username,
            email: user.email,
            role,
            avatar: None,
        };
        let token = self.generate_jwt(&identity);

        (identity, token)
    }

    pub async fn cleanup(self) {
        let Some(database_name) = self.database_name else {
            return;
        };

        self.app_state.pool.close().await;

        let mut connection = PgConnection::connect_with(&self.app_state.config.database.without_db())
            .await
            .expect("Failed to connect to Postgres");
        connection
            .execute(format!(r#"DROP DATABASE "{}" WITH (FORCE);"#, database_name).as_str())
            .await
            .expect("Failed to drop database");
    }
}

pub async fn set_role(pool: &PgPool, user_id: i64, role: Role) {
    sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Identity that was never stored; enough for gates that only read the token.
pub fn detached_identity(role: Role) -> Arc<Identity> {
    Arc::new(Identity {
        id: 1,
        username: "reader".into(),
        email: "reader@localhost".into(),
        role,
        avatar: None,
    })
}

pub async fn read_body<T: DeserializeOwned>(response: Response) -> ApiResponse<T> {
    let body = response.into_body().collect().await.unwrap().to_bytes();

    serde_json::from_slice(&body).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(axum::http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(axum::http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::empty()).unwrap()
}
