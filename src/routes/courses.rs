use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        courses::{CourseList, CourseSubmission, CreateCourseRequest, MyLearning},
        files::UploadedFile,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CourseDetails,
    response::ApiResponse,
    routes::params::CourseQuery,
    services::course_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/mine", get(my_learning))
        .route("/{id}", get(get_course).delete(delete_course))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseQuery),
    responses(
        (status = 200, description = "Filtered, sorted and paginated catalog", body = ApiResponse<CourseList>)
    ),
    tag = "Courses"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    let resp = course_service::list_courses(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course with its curriculum", body = ApiResponse<CourseDetails>),
        (status = 404, description = "Course not found"),
    ),
    tag = "Courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CourseDetails>>> {
    let resp = course_service::get_course_details(&state, id).await?;
    Ok(Json(resp))
}

/// Multipart parts: `course` (JSON `CreateCourseRequest`), `image` (cover
/// file) and any number of `files[<topic index>]` attachments.
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Course created", body = ApiResponse<CourseDetails>),
        (status = 400, description = "Malformed form"),
        (status = 422, description = "Field validation errors"),
        (status = 500, description = "A problem occurred while recording"),
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<CourseDetails>>)> {
    let submission = read_submission(multipart).await?;
    let resp = course_service::create_course(&state, &user, submission).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course archived", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the course creator"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = course_service::delete_course(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/mine",
    responses(
        (status = 200, description = "Enrolled, created and archived courses", body = ApiResponse<MyLearning>),
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn my_learning(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyLearning>>> {
    let resp = course_service::my_learning(&state, &user).await?;
    Ok(Json(resp))
}

async fn read_submission(mut multipart: Multipart) -> AppResult<CourseSubmission> {
    let mut draft: Option<CreateCourseRequest> = None;
    let mut image = None;
    let mut topic_files: BTreeMap<usize, Vec<UploadedFile>> = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "course" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid course part: {e}")))?;
                let parsed = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::BadRequest(format!("invalid course json: {e}")))?;
                draft = Some(parsed);
            }
            "image" => image = Some(read_file(field).await?),
            other => match topic_index(other) {
                Some(index) => topic_files
                    .entry(index)
                    .or_default()
                    .push(read_file(field).await?),
                None => tracing::debug!(field = other, "ignoring unknown form field"),
            },
        }
    }

    let draft = draft.ok_or_else(|| AppError::BadRequest("missing course part".into()))?;
    Ok(CourseSubmission {
        draft,
        image,
        topic_files,
    })
}

async fn read_file(field: Field<'_>) -> AppResult<UploadedFile> {
    let file_name = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(|e| {
        tracing::error!(error = %e, file_name = %file_name, "failed to read uploaded file");
        AppError::Upload
    })?;
    Ok(UploadedFile::new(file_name, content_type, bytes.to_vec()))
}

/// Topic index of a `files[<n>]` (or `files[<n>][]`) form field.
fn topic_index(field_name: &str) -> Option<usize> {
    let rest = field_name.strip_prefix("files[")?;
    let rest = rest.strip_suffix("[]").unwrap_or(rest);
    rest.strip_suffix(']')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_index_reads_bracketed_number() {
        assert_eq!(topic_index("files[0]"), Some(0));
        assert_eq!(topic_index("files[12][]"), Some(12));
        assert_eq!(topic_index("files[]"), None);
        assert_eq!(topic_index("files[x]"), None);
        assert_eq!(topic_index("image"), None);
    }
}
