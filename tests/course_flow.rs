mod common;

use std::collections::BTreeMap;

use course_marketplace::{
    dto::{
        courses::{CourseSubmission, CreateCourseRequest, CreateTopicRequest, CreateVideoRequest},
        files::UploadedFile,
    },
    entity::courses::{Column as CourseCol, Entity as Courses},
    error::AppError,
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    routes::params::{CourseQuery, CourseSorting},
    services::{course_service, file_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn submission(category_id: i32, language_id: i32, image_name: &str) -> CourseSubmission {
    let draft = CreateCourseRequest {
        title: "<script>alert(1)</script>Async Rust".into(),
        subtitle: "From futures to executors".into(),
        description: "<p onclick=\"steal()\">Learn <b>tokio</b></p><script>x()</script>".into(),
        goals: "Write services".into(),
        requirements: "Basic Rust".into(),
        price: 4900,
        category_id,
        language_id,
        curriculum: vec![CreateTopicRequest {
            title: "Getting started".into(),
            description: "Setup".into(),
            videos: vec![CreateVideoRequest {
                title: "Installing".into(),
                video_url: "https://videos.example.com/install".into(),
            }],
        }],
    };

    let mut topic_files = BTreeMap::new();
    topic_files.insert(
        0,
        vec![UploadedFile::new("notes.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
    );

    CourseSubmission {
        draft,
        image: Some(UploadedFile::new(image_name, "image/png", vec![1u8, 2, 3, 4])),
        topic_files,
    }
}

async fn course_count(state: &course_marketplace::state::AppState, creator: Uuid) -> anyhow::Result<u64> {
    Ok(Courses::find()
        .filter(CourseCol::CreatorId.eq(creator))
        .count(&state.orm)
        .await?)
}

#[tokio::test]
async fn create_course_sanitizes_uploads_and_persists() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;

    let creator = common::create_user(state, ROLE_USER).await?;
    let category = common::create_category(state, None).await?;
    let language = common::create_language(state).await?;

    let created = course_service::create_course(state, &creator, submission(category, language, "Cover.PNG"))
        .await?
        .data
        .expect("course details");

    assert_eq!(created.title, "Async Rust");
    assert!(!created.description.contains("<script"));
    assert!(!created.description.contains("onclick"));
    assert!(created.description.contains("<b>tokio</b>"));
    assert_eq!(created.creator_full_name, "Ada Lovelace");
    assert_eq!(created.category.id, category);
    assert_eq!(created.language.id, language);
    assert_eq!(created.curriculum.len(), 1);
    assert_eq!(created.curriculum[0].videos.len(), 1);
    assert_eq!(created.curriculum[0].files.len(), 1);

    // Image plus one topic attachment.
    assert_eq!(ctx.blobs.len().await, 2);

    let attachment = &created.curriculum[0].files[0];
    let blob = file_service::download(state, &attachment.source_id.to_string()).await?;
    assert_eq!(blob.bytes, b"%PDF-1.4".to_vec());
    assert_eq!(blob.info.file_name, "notes.pdf");
    assert_eq!(blob.info.content_type, "application/pdf");

    let image = file_service::download(state, &created.image.source_id.to_string()).await?;
    assert_eq!(image.bytes, vec![1u8, 2, 3, 4]);

    let err = file_service::download(state, "not-a-uuid").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = file_service::download(state, &Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn invalid_submissions_leave_no_trace() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;

    let creator = common::create_user(state, ROLE_USER).await?;
    let category = common::create_category(state, None).await?;
    let language = common::create_language(state).await?;

    let err = course_service::create_course(state, &creator, submission(category, language, "cover.bmp"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(fields) => assert!(fields.iter().any(|f| f.field == "image")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = course_service::create_course(state, &creator, submission(i32::MAX, language, "cover.png"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(fields) => assert!(fields.iter().any(|f| f.field == "category_id")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = course_service::create_course(state, &creator, submission(category, i32::MAX, "cover.png"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(fields) => assert!(fields.iter().any(|f| f.field == "language_id")),
        other => panic!("expected validation error, got {other:?}"),
    }

    assert!(ctx.blobs.is_empty().await);
    assert_eq!(course_count(state, creator.user_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn list_courses_applies_filters() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;

    let creator = common::create_user(state, ROLE_USER).await?;
    let main = common::create_category(state, None).await?;
    let sub = common::create_category(state, Some(main)).await?;
    let language = common::create_language(state).await?;
    let other_language = common::create_language(state).await?;

    let tag = common::unique("topic");
    let cheap = common::create_course(state, creator.user_id, main, language, &format!("Cheap {tag}"), 100).await?;
    let pricey = common::create_course(state, creator.user_id, sub, language, &format!("Pricey {tag}"), 9000).await?;
    let foreign = common::create_course(state, creator.user_id, sub, other_language, &format!("Foreign {tag}"), 500).await?;

    // A main category includes its sub-categories.
    let resp = course_service::list_courses(
        state,
        CourseQuery {
            category: Some(main),
            sorting: Some(CourseSorting::PriceAsc),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![cheap, foreign, pricey]);
    assert_eq!(resp.meta.and_then(|m| m.total), Some(3));

    let resp = course_service::list_courses(
        state,
        CourseQuery {
            sub_category: Some(sub),
            language: Some(language),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![pricey]);

    let resp = course_service::list_courses(
        state,
        CourseQuery {
            q: Some(tag.to_uppercase()),
            min_price: Some(200),
            max_price: Some(1000),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![foreign]);

    // Wildcards in the search term are matched literally.
    for term in ["%", "_"] {
        let resp = course_service::list_courses(
            state,
            CourseQuery {
                category: Some(main),
                q: Some(term.to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert!(resp.data.expect("list").items.is_empty(), "{term} matched courses");
    }

    // A page far past the end is empty rather than an error.
    let resp = course_service::list_courses(
        state,
        CourseQuery {
            category: Some(main),
            page: Some(i64::MAX),
            ..Default::default()
        },
    )
    .await?;
    assert!(resp.data.expect("list").items.is_empty());

    let resp = course_service::list_courses(
        state,
        CourseQuery {
            category: Some(main),
            sorting: Some(CourseSorting::PriceDesc),
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![cheap]);

    Ok(())
}

#[tokio::test]
async fn delete_course_requires_creator_or_admin() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;

    let creator = common::create_user(state, ROLE_USER).await?;
    let stranger = common::create_user(state, ROLE_USER).await?;
    let admin = common::create_user(state, ROLE_ADMIN).await?;
    let category = common::create_category(state, None).await?;
    let language = common::create_language(state).await?;
    let mine = common::create_course(state, creator.user_id, category, language, "Mine", 100).await?;
    let theirs = common::create_course(state, creator.user_id, category, language, "Theirs", 100).await?;

    let err = course_service::delete_course(state, &stranger, mine)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    course_service::get_course_details(state, mine).await?;

    course_service::delete_course(state, &creator, mine).await?;
    let err = course_service::get_course_details(state, mine)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    course_service::delete_course(state, &admin, theirs).await?;
    let err = course_service::delete_course(state, &admin, theirs)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Soft-deleted courses show up as archived for their creator.
    let learning = course_service::my_learning(state, &creator)
        .await?
        .data
        .expect("my learning");
    assert!(learning.created.is_empty());
    assert_eq!(learning.archived.len(), 2);

    Ok(())
}
