use chrono::{DateTime, Utc};

#[derive(sqlx::Type, serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(sqlx::Type, serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "manga_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
}

#[derive(sqlx::Type, serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    AddChapter,
    UpdateChapter,
    DeleteChapter,
    UpdatePages,
}

/// Identity carried inside a session token.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Stored credential row. Never serialized.
#[derive(sqlx::FromRow, Debug)]
pub struct Credential {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub password_hash: String,
}

impl From<&Credential> for Identity {
    fn from(credential: &Credential) -> Self {
        Identity {
            id: credential.id,
            username: credential.username.clone(),
            email: credential.email.clone(),
            role: credential.role,
            avatar: credential.avatar.clone(),
        }
    }
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub token: String,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: i64,
    pub title: String,
    pub title_original: Option<String>,
    pub description: String,
    pub author: String,
    pub artist: Option<String>,
    pub status: MangaStatus,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: f64,
    pub views: i64,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub manga_id: i64,
    pub chapter_number: f64,
    pub title: Option<String>,
    pub pages: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct FavoriteManga {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub manga: Manga,
    pub added_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ReadingHistoryItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub manga: Manga,
    pub chapter_id: i64,
    pub chapter_number: f64,
    pub chapter_title: Option<String>,
    pub page_number: i32,
    pub read_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ReadingProgress {
    pub id: i64,
    pub user_id: i64,
    pub manga_id: i64,
    pub chapter_id: i64,
    pub page_number: i32,
    pub read_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    pub manga_id: Option<i64>,
    pub action: AuditAction,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Audit record joined with the actor's username and the target manga title.
#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct AuditEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: AuditRecord,
    pub username: Option<String>,
    pub manga_title: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        PaginationMeta {
            page,
            limit,
            total,
            pages: page_count(total, limit),
        }
    }
}

/// `ceil(total / limit)`, zero when there is nothing to page through.
pub fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }

    (total + limit - 1) / limit
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct MangaPage {
    pub manga: Vec<Manga>,
    pub pagination: PaginationMeta,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct UserStats {
    pub favorites_count: i64,
    pub chapters_read: i64,
    pub favorite_genres: Vec<GenreCount>,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Cover {
    pub cover_image: Option<String>,
}
