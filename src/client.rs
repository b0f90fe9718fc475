//! Typed HTTP client for the catalog API.
//!
//! Holds the session token returned by [`ApiClient::login`] and attaches it to
//! every call that needs authentication.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    controllers::health::Health,
    model::{
        AuditEntry, Chapter, Cover, FavoriteManga, Manga, MangaPage, Profile, PublicUser,
        ReadingHistoryItem, ReadingProgress, Session, UserStats, UserSummary,
    },
    payload::{
        AuditLogParams, ChapterChanges, CoverUpload, FavoriteRequest, MangaChanges,
        MangaListParams, NewChapter, NewManga, PagesUpload, ProfileChanges,
        ReadingProgressRequest,
    },
    response::{ApiResponse, FieldError},
};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Response carried no data")]
    MissingData,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;

        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status,
                    message: status.to_string(),
                    details: Vec::new(),
                });
            }
            Err(error) => return Err(ClientError::Decode(error)),
        };

        if !status.is_success() || !body.success {
            return Err(ClientError::Api {
                status,
                message: body.error.unwrap_or_else(|| status.to_string()),
                details: body.details.unwrap_or_default(),
            });
        }

        Ok(body)
    }

    async fn data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        Self::send::<T>(request)
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }

    async fn acknowledge(request: RequestBuilder) -> Result<Option<String>, ClientError> {
        Ok(Self::send::<serde_json::Value>(request).await?.message)
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self
            .request(Method::GET, "/api/health")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, ClientError> {
        let body = json!({"username": username, "email": email, "password": password});

        Self::data(self.request(Method::POST, "/api/auth/register").json(&body)).await
    }

    /// Stores the returned token for subsequent calls.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<Session, ClientError> {
        let body = json!({"login": login, "password": password});
        let session: Session =
            Self::data(self.request(Method::POST, "/api/auth/login").json(&body)).await?;

        self.token = Some(session.token.clone());

        Ok(session)
    }

    /// Drops the local token even when the server call fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let result = Self::acknowledge(self.request(Method::POST, "/api/auth/logout")).await;
        self.token = None;

        result.map(|_| ())
    }

    pub async fn list_manga(&self, params: &MangaListParams) -> Result<MangaPage, ClientError> {
        Self::data(self.request(Method::GET, "/api/manga").query(params)).await
    }

    pub async fn get_manga(&self, id: i64) -> Result<Manga, ClientError> {
        Self::data(self.request(Method::GET, &format!("/api/manga/{id}"))).await
    }

    pub async fn get_chapters(&self, manga_id: i64) -> Result<Vec<Chapter>, ClientError> {
        Self::data(self.request(Method::GET, &format!("/api/manga/{manga_id}/chapters"))).await
    }

    pub async fn create_manga(&self, manga: &NewManga) -> Result<Manga, ClientError> {
        Self::data(self.authorized(Method::POST, "/api/manga")?.json(manga)).await
    }

    pub async fn update_manga(&self, id: i64, changes: &MangaChanges) -> Result<Manga, ClientError> {
        let request = self.authorized(Method::PUT, &format!("/api/manga/{id}"))?;

        Self::data(request.json(changes)).await
    }

    pub async fn delete_manga(&self, id: i64) -> Result<(), ClientError> {
        let request = self.authorized(Method::DELETE, &format!("/api/manga/{id}"))?;

        Self::acknowledge(request).await.map(|_| ())
    }

    pub async fn upload_cover(&self, id: i64, cover_image: &str) -> Result<Cover, ClientError> {
        let request = self.authorized(Method::POST, &format!("/api/manga/{id}/cover"))?;
        let body = CoverUpload {
            cover_image: cover_image.to_string(),
        };

        Self::data(request.json(&body)).await
    }

    pub async fn audit_log(&self, limit: Option<i64>) -> Result<Vec<AuditEntry>, ClientError> {
        let request = self
            .authorized(Method::GET, "/api/manga/history")?
            .query(&AuditLogParams { limit });

        Self::data(request).await
    }

    pub async fn get_chapter(&self, id: i64) -> Result<Chapter, ClientError> {
        Self::data(self.request(Method::GET, &format!("/api/chapters/{id}"))).await
    }

    pub async fn create_chapter(&self, chapter: &NewChapter) -> Result<Chapter, ClientError> {
        Self::data(self.authorized(Method::POST, "/api/chapters")?.json(chapter)).await
    }

    pub async fn update_chapter(
        &self,
        id: i64,
        changes: &ChapterChanges,
    ) -> Result<Chapter, ClientError> {
        let request = self.authorized(Method::PUT, &format!("/api/chapters/{id}"))?;

        Self::data(request.json(changes)).await
    }

    pub async fn delete_chapter(&self, id: i64) -> Result<(), ClientError> {
        let request = self.authorized(Method::DELETE, &format!("/api/chapters/{id}"))?;

        Self::acknowledge(request).await.map(|_| ())
    }

    pub async fn upload_pages(&self, id: i64, pages: Vec<String>) -> Result<Chapter, ClientError> {
        let request = self.authorized(Method::POST, &format!("/api/chapters/{id}/pages"))?;

        Self::data(request.json(&PagesUpload { pages })).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        Self::data(self.authorized(Method::GET, "/api/users")?).await
    }

    pub async fn profile(&self) -> Result<Profile, ClientError> {
        Self::data(self.authorized(Method::GET, "/api/users/profile")?).await
    }

    pub async fn update_profile(&self, changes: &ProfileChanges) -> Result<Profile, ClientError> {
        let request = self.authorized(Method::PUT, "/api/users/profile")?;

        Self::data(request.json(changes)).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let body = json!({"current_password": current_password, "new_password": new_password});
        let request = self.authorized(Method::PUT, "/api/users/password")?.json(&body);

        Self::acknowledge(request).await.map(|_| ())
    }

    pub async fn stats(&self) -> Result<UserStats, ClientError> {
        Self::data(self.authorized(Method::GET, "/api/users/stats")?).await
    }

    pub async fn favorites(&self) -> Result<Vec<FavoriteManga>, ClientError> {
        Self::data(self.authorized(Method::GET, "/api/users/favorites")?).await
    }

    pub async fn add_favorite(&self, manga_id: i64) -> Result<(), ClientError> {
        let request = self.authorized(Method::POST, "/api/users/favorites")?;

        Self::acknowledge(request.json(&FavoriteRequest { manga_id }))
            .await
            .map(|_| ())
    }

    pub async fn remove_favorite(&self, manga_id: i64) -> Result<(), ClientError> {
        let request = self.authorized(Method::DELETE, &format!("/api/users/favorites/{manga_id}"))?;

        Self::acknowledge(request).await.map(|_| ())
    }

    pub async fn reading_history(&self) -> Result<Vec<ReadingHistoryItem>, ClientError> {
        Self::data(self.authorized(Method::GET, "/api/users/reading-history")?).await
    }

    pub async fn save_progress(
        &self,
        progress: &ReadingProgressRequest,
    ) -> Result<ReadingProgress, ClientError> {
        let request = self.authorized(Method::POST, "/api/users/reading-history")?;

        Self::data(request.json(progress)).await
    }
}
