use std::borrow::Cow;

use chrono::Datelike;
use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, IntoDeserializer},
};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::model::MangaStatus;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_AUDIT_LIMIT: i64 = 200;
pub const MIN_MANGA_YEAR: i32 = 1900;
/// Width of the `users.email` column.
pub const MAX_EMAIL_LEN: u64 = 255;

/// Distinguishes an absent member (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query parameters arrive as strings; an empty one means "not given".
fn empty_as_none<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::deserialize(IntoDeserializer::<D::Error>::into_deserializer(value)).map(Some),
    }
}

pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

fn trimmed_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| value.map(|v| v.trim().to_string()))
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email() && email.validate_length(None, Some(MAX_EMAIL_LEN), None)
}

fn add_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    errors.add(
        field,
        ValidationError::new(code).with_message(Cow::from(message)),
    );
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: Option<u64>,
    max: Option<u64>,
    message: &'static str,
) {
    if !value.validate_length(min, max, None) {
        add_error(errors, field, "length", message);
    }
}

fn check_year(errors: &mut ValidationErrors, year: i32) {
    let current_year = chrono::Utc::now().year();
    if !(MIN_MANGA_YEAR..=current_year).contains(&year) {
        add_error(
            errors,
            "year",
            "range",
            "Year must be between 1900 and the current year",
        );
    }
}

fn check_rating(errors: &mut ValidationErrors, rating: f64) {
    if !rating.is_finite() || rating < 0.0 {
        add_error(errors, "rating", "range", "Rating must be a non-negative number");
    }
}

fn check_views(errors: &mut ValidationErrors, views: i64) {
    if views < 0 {
        add_error(errors, "views", "range", "Views must be non-negative");
    }
}

fn check_chapter_number(errors: &mut ValidationErrors, chapter_number: f64) {
    if !chapter_number.is_finite() || chapter_number < 0.0 {
        add_error(
            errors,
            "chapter_number",
            "range",
            "Chapter number must be a non-negative number",
        );
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct NewManga {
    pub title: String,
    #[serde(default)]
    pub title_original: Option<String>,
    pub description: String,
    pub author: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub status: MangaStatus,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl Validate for NewManga {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_length(&mut errors, "title", &self.title, Some(1), Some(255), "Title length must be between 1 and 255");
        if let Some(title_original) = &self.title_original {
            check_length(&mut errors, "title_original", title_original, None, Some(255), "Original title must be at most 255 characters");
        }
        check_length(&mut errors, "description", &self.description, Some(1), None, "Description must not be empty");
        check_length(&mut errors, "author", &self.author, Some(1), Some(255), "Author length must be between 1 and 255");
        if let Some(artist) = &self.artist {
            check_length(&mut errors, "artist", artist, None, Some(255), "Artist must be at most 255 characters");
        }
        if let Some(year) = self.year {
            check_year(&mut errors, year);
        }
        check_rating(&mut errors, self.rating);
        check_views(&mut errors, self.views);

        into_result(errors)
    }
}

/// Sparse manga update. Unknown members are ignored by deserialization.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MangaChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub title_original: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub artist: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MangaStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub year: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<Option<String>>,
}

impl MangaChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.title_original.is_none()
            && self.description.is_none()
            && self.author.is_none()
            && self.artist.is_none()
            && self.status.is_none()
            && self.genres.is_none()
            && self.year.is_none()
            && self.rating.is_none()
            && self.views.is_none()
            && self.cover_image.is_none()
    }
}

impl Validate for MangaChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(title) = &self.title {
            check_length(&mut errors, "title", title, Some(1), Some(255), "Title length must be between 1 and 255");
        }
        if let Some(Some(title_original)) = &self.title_original {
            check_length(&mut errors, "title_original", title_original, None, Some(255), "Original title must be at most 255 characters");
        }
        if let Some(description) = &self.description {
            check_length(&mut errors, "description", description, Some(1), None, "Description must not be empty");
        }
        if let Some(author) = &self.author {
            check_length(&mut errors, "author", author, Some(1), Some(255), "Author length must be between 1 and 255");
        }
        if let Some(Some(artist)) = &self.artist {
            check_length(&mut errors, "artist", artist, None, Some(255), "Artist must be at most 255 characters");
        }
        if let Some(Some(year)) = self.year {
            check_year(&mut errors, year);
        }
        if let Some(rating) = self.rating {
            check_rating(&mut errors, rating);
        }
        if let Some(views) = self.views {
            check_views(&mut errors, views);
        }

        into_result(errors)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct CoverUpload {
    #[validate(length(min = 1, message = "Cover image must not be empty"))]
    pub cover_image: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct NewChapter {
    pub manga_id: i64,
    pub chapter_number: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pages: Vec<String>,
}

impl Validate for NewChapter {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.manga_id < 1 {
            add_error(&mut errors, "manga_id", "range", "Manga id must be a positive integer");
        }
        check_chapter_number(&mut errors, self.chapter_number);
        if let Some(title) = &self.title {
            check_length(&mut errors, "title", title, None, Some(255), "Title must be at most 255 characters");
        }

        into_result(errors)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChapterChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<f64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<String>>,
}

impl ChapterChanges {
    pub fn is_empty(&self) -> bool {
        self.chapter_number.is_none() && self.title.is_none() && self.pages.is_none()
    }
}

impl Validate for ChapterChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(chapter_number) = self.chapter_number {
            check_chapter_number(&mut errors, chapter_number);
        }
        if let Some(Some(title)) = &self.title {
            check_length(&mut errors, "title", title, None, Some(255), "Title must be at most 255 characters");
        }

        into_result(errors)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct PagesUpload {
    pub pages: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    #[serde(default, deserialize_with = "trimmed_option", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub banner: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
}

impl Validate for ProfileChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(username) = &self.username {
            check_length(&mut errors, "username", username, Some(3), Some(30), "Username length must be between 3 and 30");
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                add_error(&mut errors, "email", "email", "Incorrect email format");
            }
        }
        if let Some(Some(bio)) = &self.bio {
            check_length(&mut errors, "bio", bio, None, Some(500), "Bio must be at most 500 characters");
        }

        into_result(errors)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct FavoriteRequest {
    #[validate(range(min = 1, message = "Manga id must be a positive integer"))]
    pub manga_id: i64,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct ReadingProgressRequest {
    #[validate(range(min = 1, message = "Manga id must be a positive integer"))]
    pub manga_id: i64,
    #[validate(range(min = 1, message = "Chapter id must be a positive integer"))]
    pub chapter_id: i64,
    #[validate(range(min = 1, message = "Page number must be a positive integer"))]
    pub page_number: i32,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Validate)]
pub struct MangaListParams {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub status: Option<MangaStatus>,

    /// Comma-separated genre names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl MangaListParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    /// Saturates instead of overflowing; a page far past the end reads nothing.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn filter(&self) -> MangaFilter {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        MangaFilter {
            search: non_empty(&self.search),
            status: self.status,
            genres: self.genres.as_deref().map(split_genres).unwrap_or_default(),
            author: non_empty(&self.author),
        }
    }
}

/// Conjunctive catalog filter; empty members do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaFilter {
    pub search: Option<String>,
    pub status: Option<MangaStatus>,
    pub genres: Vec<String>,
    pub author: Option<String>,
}

pub fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Validate)]
pub struct AuditLogParams {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 200, message = "Limit must be between 1 and 200"))]
    pub limit: Option<i64>,
}

impl AuditLogParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_AUDIT_LIMIT)
    }
}
