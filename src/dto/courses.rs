use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::files::UploadedFile, models::CourseListing};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    pub video_url: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub videos: Vec<CreateVideoRequest>,
}

/// JSON part of the course creation form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub description: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub requirements: String,
    pub price: i64,
    pub category_id: i32,
    pub language_id: i32,
    #[serde(default)]
    pub curriculum: Vec<CreateTopicRequest>,
}

/// Everything submitted with the course creation form.
#[derive(Debug, Clone)]
pub struct CourseSubmission {
    pub draft: CreateCourseRequest,
    pub image: Option<UploadedFile>,
    /// Attachments keyed by the index of the topic they belong to.
    pub topic_files: BTreeMap<usize, Vec<UploadedFile>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseList {
    pub items: Vec<CourseListing>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyLearning {
    pub enrolled: Vec<CourseListing>,
    pub created: Vec<CourseListing>,
    pub archived: Vec<CourseListing>,
}
