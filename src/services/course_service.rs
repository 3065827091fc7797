use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LikeExpr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::courses::{CourseList, CourseSubmission, CreateCourseRequest, MyLearning},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        course_files::{ActiveModel as CourseFileActive, Column as CourseFileCol, Entity as CourseFiles},
        courses::{ActiveModel as CourseActive, Column as CourseCol, Entity as Courses, Model as CourseModel},
        enrollments::{Column as EnrollmentCol, Entity as Enrollments},
        languages::Entity as Languages,
        shopping_cart_courses::{Column as CartCourseCol, Entity as CartCourses},
        topics::{ActiveModel as TopicActive, Column as TopicCol, Entity as Topics},
        users::Entity as Users,
        videos::{ActiveModel as VideoActive, Column as VideoCol, Entity as Videos},
    },
    error::{AppError, AppResult, FieldError},
    middleware::auth::AuthUser,
    models::{Category, CourseDetails, CourseListing, FileInfo, Language, Topic, Video, file_url},
    response::{ApiResponse, Meta},
    routes::params::{CourseQuery, CourseSorting},
    sanitize::{ACCEPTED_IMAGE_EXTENSIONS, is_accepted_image, sanitize_in_place},
    services::{file_service, lookup_service},
    state::AppState,
};

const TITLE_MAX_LEN: usize = 50;
const VIDEO_TITLE_MIN_LEN: usize = 3;
const VIDEO_TITLE_MAX_LEN: usize = 50;

pub async fn list_courses(
    state: &AppState,
    query: CourseQuery,
) -> AppResult<ApiResponse<CourseList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(CourseCol::IsDeleted.eq(false));

    if let Some(category_id) = query.category {
        // A main category also matches courses filed under its sub-categories.
        let mut category_ids: Vec<i32> = Categories::find()
            .select_only()
            .column(CategoryCol::Id)
            .filter(CategoryCol::ParentId.eq(category_id))
            .into_tuple()
            .all(&state.orm)
            .await?;
        category_ids.push(category_id);
        condition = condition.add(CourseCol::CategoryId.is_in(category_ids));
    }

    if let Some(sub_category_id) = query.sub_category {
        condition = condition.add(CourseCol::CategoryId.eq(sub_category_id));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        let like = || LikeExpr::new(pattern.clone()).escape('\\');
        condition = condition.add(
            Condition::any()
                .add(Expr::col(CourseCol::Title).ilike(like()))
                .add(Expr::col(CourseCol::Subtitle).ilike(like()))
                .add(Expr::col(CourseCol::Description).ilike(like())),
        );
    }

    if let Some(language_id) = query.language {
        condition = condition.add(CourseCol::LanguageId.eq(language_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(CourseCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(CourseCol::Price.lte(max_price));
    }

    let finder = Courses::find().filter(condition);
    let finder = match query.sorting.unwrap_or_default() {
        CourseSorting::Newest => finder.order_by_desc(CourseCol::CreatedAt),
        CourseSorting::PriceAsc => finder.order_by_asc(CourseCol::Price),
        CourseSorting::PriceDesc => finder.order_by_desc(CourseCol::Price),
        CourseSorting::Rating => finder.order_by_desc(CourseCol::Rating),
        CourseSorting::Title => finder.order_by_asc(CourseCol::Title),
    }
    .order_by_asc(CourseCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(listing_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Courses", CourseList { items }, Some(meta)))
}

pub async fn get_course_details(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CourseDetails>> {
    let details = load_details(&state.orm, id).await?;
    Ok(ApiResponse::success("Course", details, None))
}

async fn load_details(db: &DatabaseConnection, id: Uuid) -> AppResult<CourseDetails> {
    let course = Courses::find_by_id(id)
        .one(db)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(AppError::NotFound)?;

    let creator = Users::find_by_id(course.creator_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("course {id} has no creator")))?;
    let category = Categories::find_by_id(course.category_id)
        .one(db)
        .await?
        .map(lookup_service::category_from_entity)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("course {id} has no category")))?;
    let language = Languages::find_by_id(course.language_id)
        .one(db)
        .await?
        .map(lookup_service::language_from_entity)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("course {id} has no language")))?;

    let topics = Topics::find()
        .filter(TopicCol::CourseId.eq(course.id))
        .order_by_asc(TopicCol::Position)
        .all(db)
        .await?;
    let topic_ids: Vec<Uuid> = topics.iter().map(|t| t.id).collect();

    let mut videos: HashMap<Uuid, Vec<Video>> = HashMap::new();
    for video in Videos::find()
        .filter(VideoCol::TopicId.is_in(topic_ids.clone()))
        .order_by_asc(VideoCol::Position)
        .all(db)
        .await?
    {
        videos.entry(video.topic_id).or_default().push(Video {
            id: video.id,
            position: video.position,
            title: video.title,
            video_url: video.video_url,
        });
    }

    let mut files: HashMap<Uuid, Vec<FileInfo>> = HashMap::new();
    for file in CourseFiles::find()
        .filter(CourseFileCol::TopicId.is_in(topic_ids))
        .order_by_asc(CourseFileCol::FileName)
        .all(db)
        .await?
    {
        files.entry(file.topic_id).or_default().push(FileInfo {
            url: file_url(file.source_id),
            file_name: file.file_name,
            source_id: file.source_id,
            content_type: file.content_type,
            file_length: file.file_length,
        });
    }

    let curriculum = topics
        .into_iter()
        .map(|topic| Topic {
            videos: videos.remove(&topic.id).unwrap_or_default(),
            files: files.remove(&topic.id).unwrap_or_default(),
            id: topic.id,
            position: topic.position,
            title: topic.title,
            description: topic.description,
        })
        .collect();

    let enrolled_count = Enrollments::find()
        .filter(EnrollmentCol::CourseId.eq(course.id))
        .count(db)
        .await? as i64;

    Ok(CourseDetails {
        id: course.id,
        title: course.title,
        subtitle: course.subtitle,
        description: course.description,
        goals: course.goals,
        requirements: course.requirements,
        price: course.price,
        rating: course.rating,
        image: FileInfo {
            file_name: course.image_file_name,
            source_id: course.image_source_id,
            content_type: course.image_content_type,
            file_length: course.image_length,
            url: file_url(course.image_source_id),
        },
        creator_id: creator.id,
        creator_full_name: creator.full_name(),
        category,
        language,
        curriculum,
        enrolled_count,
        created_at: course.created_at.with_timezone(&Utc),
    })
}

/// Sanitizes, validates, uploads and persists a new course.
///
/// Nothing is uploaded or written unless the whole submission validates.
pub async fn create_course(
    state: &AppState,
    user: &AuthUser,
    mut submission: CourseSubmission,
) -> AppResult<ApiResponse<CourseDetails>> {
    sanitize_draft(&mut submission.draft);

    let categories = lookup_service::load_categories(&state.orm).await?;
    let languages = lookup_service::load_languages(&state.orm).await?;
    validate_submission(&submission, &categories, &languages).map_err(AppError::Validation)?;

    let CourseSubmission {
        draft,
        image,
        topic_files,
    } = submission;
    let image = image.ok_or_else(|| AppError::BadRequest("image is required".into()))?;

    let image = file_service::store_upload(state, &image).await?;
    let mut uploaded: Vec<Uuid> = vec![image.source_id];
    let mut files_by_topic: HashMap<usize, Vec<FileInfo>> = HashMap::new();
    for (index, files) in topic_files {
        match file_service::upload_files(state, &files).await {
            Ok(stored) => {
                for file in &stored {
                    uploaded.push(file.source_id);
                }
                files_by_topic.insert(index, stored);
            }
            Err(err) => {
                file_service::discard(state, uploaded).await;
                return Err(err);
            }
        }
    }

    let course_id = match persist_course(state, user, &draft, &image, &mut files_by_topic).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(error = %err, "course persistence failed, discarding uploads");
            file_service::discard(state, uploaded).await;
            return Err(err);
        }
    };

    audit::record(
        state,
        Some(user.user_id),
        "course_create",
        "courses",
        serde_json::json!({ "course_id": course_id }),
    )
    .await;

    let details = load_details(&state.orm, course_id).await?;
    Ok(ApiResponse::success("Course created", details, Some(Meta::empty())))
}

async fn persist_course(
    state: &AppState,
    user: &AuthUser,
    draft: &CreateCourseRequest,
    image: &FileInfo,
    files_by_topic: &mut HashMap<usize, Vec<FileInfo>>,
) -> AppResult<Uuid> {
    let txn = state.orm.begin().await?;

    let course = CourseActive {
        id: Set(Uuid::new_v4()),
        title: Set(draft.title.clone()),
        subtitle: Set(draft.subtitle.clone()),
        description: Set(draft.description.clone()),
        goals: Set(draft.goals.clone()),
        requirements: Set(draft.requirements.clone()),
        price: Set(draft.price),
        rating: Set(0.0),
        image_source_id: Set(image.source_id),
        image_file_name: Set(image.file_name.clone()),
        image_content_type: Set(image.content_type.clone()),
        image_length: Set(image.file_length),
        creator_id: Set(user.user_id),
        category_id: Set(draft.category_id),
        language_id: Set(draft.language_id),
        is_deleted: Set(false),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (index, topic) in draft.curriculum.iter().enumerate() {
        let topic_row = TopicActive {
            id: Set(Uuid::new_v4()),
            course_id: Set(course.id),
            position: Set(index as i32),
            title: Set(topic.title.clone()),
            description: Set(topic.description.clone()),
        }
        .insert(&txn)
        .await?;

        for (position, video) in topic.videos.iter().enumerate() {
            VideoActive {
                id: Set(Uuid::new_v4()),
                topic_id: Set(topic_row.id),
                position: Set(position as i32),
                title: Set(video.title.clone()),
                video_url: Set(video.video_url.clone()),
            }
            .insert(&txn)
            .await?;
        }

        for file in files_by_topic.remove(&index).unwrap_or_default() {
            CourseFileActive {
                id: Set(Uuid::new_v4()),
                topic_id: Set(topic_row.id),
                file_name: Set(file.file_name),
                source_id: Set(file.source_id),
                content_type: Set(file.content_type),
                file_length: Set(file.file_length),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    Ok(course.id)
}

/// Soft-deletes a course; only its creator or an admin may do so.
pub async fn delete_course(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let course = Courses::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(AppError::NotFound)?;

    if course.creator_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let txn = state.orm.begin().await?;
    let mut active: CourseActive = course.into();
    active.is_deleted = Set(true);
    active.update(&txn).await?;

    // A deleted course can no longer be bought.
    CartCourses::delete_many()
        .filter(CartCourseCol::CourseId.eq(id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "course_delete",
        "courses",
        serde_json::json!({ "course_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

pub async fn my_learning(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MyLearning>> {
    let enrolled = Courses::find()
        .inner_join(Enrollments)
        .filter(EnrollmentCol::UserId.eq(user.user_id))
        .filter(CourseCol::IsDeleted.eq(false))
        .order_by_desc(CourseCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let owned = Courses::find()
        .filter(CourseCol::CreatorId.eq(user.user_id))
        .order_by_desc(CourseCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let (archived, created): (Vec<CourseModel>, Vec<CourseModel>) =
        owned.into_iter().partition(|c| c.is_deleted);

    let data = MyLearning {
        enrolled: enrolled.into_iter().map(listing_from_entity).collect(),
        created: created.into_iter().map(listing_from_entity).collect(),
        archived: archived.into_iter().map(listing_from_entity).collect(),
    };
    Ok(ApiResponse::success("My learning", data, Some(Meta::empty())))
}

/// HTML-sanitizes every free-text field of the draft.
pub fn sanitize_draft(draft: &mut CreateCourseRequest) {
    sanitize_in_place(&mut draft.title);
    sanitize_in_place(&mut draft.subtitle);
    sanitize_in_place(&mut draft.description);
    sanitize_in_place(&mut draft.goals);
    sanitize_in_place(&mut draft.requirements);
    for topic in &mut draft.curriculum {
        sanitize_in_place(&mut topic.title);
        sanitize_in_place(&mut topic.description);
        for video in &mut topic.videos {
            sanitize_in_place(&mut video.title);
            sanitize_in_place(&mut video.video_url);
        }
    }
}

/// Checks a sanitized submission against the current category and language sets.
pub fn validate_submission(
    submission: &CourseSubmission,
    categories: &[Category],
    languages: &[Language],
) -> Result<(), Vec<FieldError>> {
    let draft = &submission.draft;
    let mut errors = Vec::new();

    match &submission.image {
        None => errors.push(FieldError::new("image", "Image is required")),
        Some(image) if !is_accepted_image(&image.file_name) => errors.push(FieldError::new(
            "image",
            format!(
                "Unsupported file! File should be one of the following types: {}",
                ACCEPTED_IMAGE_EXTENSIONS.join("/")
            ),
        )),
        Some(image) if image.is_empty() => {
            errors.push(FieldError::new("image", "Image is empty"));
        }
        Some(_) => {}
    }

    let title_len = draft.title.trim().chars().count();
    if title_len == 0 {
        errors.push(FieldError::new("title", "Title is required"));
    } else if title_len > TITLE_MAX_LEN {
        errors.push(FieldError::new(
            "title",
            format!("Title must be at most {TITLE_MAX_LEN} characters"),
        ));
    }
    if draft.description.trim().is_empty() {
        errors.push(FieldError::new("description", "Description is required"));
    }
    if draft.price < 0 {
        errors.push(FieldError::new("price", "Price cannot be negative"));
    }
    if !categories.iter().any(|c| c.id == draft.category_id) {
        errors.push(FieldError::new("category_id", "Category does not exist"));
    }
    if !languages.iter().any(|l| l.id == draft.language_id) {
        errors.push(FieldError::new("language_id", "Language does not exist"));
    }

    for (t, topic) in draft.curriculum.iter().enumerate() {
        if topic.title.trim().is_empty() {
            errors.push(FieldError::new(
                format!("curriculum[{t}].title"),
                "Topic title is required",
            ));
        }
        for (v, video) in topic.videos.iter().enumerate() {
            let len = video.title.trim().chars().count();
            if !(VIDEO_TITLE_MIN_LEN..=VIDEO_TITLE_MAX_LEN).contains(&len) {
                errors.push(FieldError::new(
                    format!("curriculum[{t}].videos[{v}].title"),
                    format!(
                        "Video title must be between {VIDEO_TITLE_MIN_LEN} and {VIDEO_TITLE_MAX_LEN} characters"
                    ),
                ));
            }
            if url::Url::parse(&video.video_url).is_err() {
                errors.push(FieldError::new(
                    format!("curriculum[{t}].videos[{v}].video_url"),
                    "Video URL must be an absolute URL",
                ));
            }
        }
    }

    for index in submission.topic_files.keys() {
        if *index >= draft.curriculum.len() {
            errors.push(FieldError::new(
                format!("files[{index}]"),
                "Topic does not exist",
            ));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// `%term%` with the term's own `%`, `_` and `\` matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn listing_from_entity(model: CourseModel) -> CourseListing {
    CourseListing {
        id: model.id,
        title: model.title,
        image_url: file_url(model.image_source_id),
        price: model.price,
        rating: model.rating,
    }
}
