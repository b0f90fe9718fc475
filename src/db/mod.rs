use sqlx::{Postgres, Transaction};

pub mod audit;
pub mod chapter;
pub mod error;
pub mod favorite;
pub mod manga;
pub mod reading_history;
pub mod user;

pub type PostgresTransaction = Transaction<'static, Postgres>;

pub const USER_USERNAME_KEY: &str = "users_username_key";
pub const USER_EMAIL_KEY: &str = "users_email_key";
pub const CHAPTER_NUMBER_KEY: &str = "chapters_manga_id_chapter_number_key";
pub const FAVORITE_KEY: &str = "favorites_user_id_manga_id_key";
pub const READING_HISTORY_KEY: &str = "reading_history_user_id_manga_id_chapter_id_key";
