use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of an account; the password hash never leaves the service layer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

/// Reference to a blob held in the file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    pub file_name: String,
    pub source_id: Uuid,
    pub content_type: String,
    pub file_length: i64,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseListing {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub price: i64,
    pub rating: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub video_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Topic {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: String,
    pub videos: Vec<Video>,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseDetails {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub goals: String,
    pub requirements: String,
    pub price: i64,
    pub rating: f64,
    pub image: FileInfo,
    pub creator_id: Uuid,
    pub creator_full_name: String,
    pub category: Category,
    pub language: Language,
    pub curriculum: Vec<Topic>,
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Cart line with the denormalized fields needed to display it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartCourse {
    pub id: Uuid,
    pub name: String,
    pub creator_full_name: String,
    pub image_url: String,
    pub price: i64,
}

/// Download route for a stored blob.
pub fn file_url(source_id: Uuid) -> String {
    format!("/api/files/{source_id}")
}
