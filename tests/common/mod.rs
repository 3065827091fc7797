#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use course_marketplace::{
    blob_store::MemoryBlobStore,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::ActiveModel as CategoryActive, courses::ActiveModel as CourseActive,
        languages::ActiveModel as LanguageActive, users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

// Tests in one binary run concurrently; the schema is applied by the first one.
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub state: AppState,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Connects to the test database, or returns `None` when none is configured.
///
/// Rows are keyed by fresh uuids and names so tests can share the database
/// without truncating it.
pub async fn setup() -> anyhow::Result<Option<TestContext>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await })
        .await?;

    let blobs = Arc::new(MemoryBlobStore::new());
    let state = AppState {
        orm,
        blobs: blobs.clone(),
        jwt_secret: Arc::from(TEST_JWT_SECRET),
    };
    Ok(Some(TestContext { state, blobs }))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", unique("user"))),
        password_hash: Set("dummy".into()),
        first_name: Set("Ada".into()),
        last_name: Set("Lovelace".into()),
        role: Set(role.into()),
        shopping_cart_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        token_id: Uuid::new_v4(),
        expires_at: Utc::now().timestamp() + 3600,
    })
}

pub async fn create_category(state: &AppState, parent_id: Option<i32>) -> anyhow::Result<i32> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(unique("category")),
        parent_id: Set(parent_id),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_language(state: &AppState) -> anyhow::Result<i32> {
    let language = LanguageActive {
        id: NotSet,
        name: Set(unique("language")),
    }
    .insert(&state.orm)
    .await?;
    Ok(language.id)
}

/// Inserts a course row directly, bypassing the upload pipeline.
pub async fn create_course(
    state: &AppState,
    creator_id: Uuid,
    category_id: i32,
    language_id: i32,
    title: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let course = CourseActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        subtitle: Set(String::new()),
        description: Set(format!("About {title}")),
        goals: Set(String::new()),
        requirements: Set(String::new()),
        price: Set(price),
        rating: Set(0.0),
        image_source_id: Set(Uuid::new_v4()),
        image_file_name: Set("cover.png".into()),
        image_content_type: Set("image/png".into()),
        image_length: Set(0),
        creator_id: Set(creator_id),
        category_id: Set(category_id),
        language_id: Set(language_id),
        is_deleted: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(course.id)
}
