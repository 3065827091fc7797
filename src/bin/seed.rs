use course_marketplace::{
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{self, Column as CategoryCol, Entity as Categories},
        languages::{self, Column as LanguageCol, Entity as Languages},
        users::{self, Column as UserCol, Entity as Users},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::auth_service::hash_password,
};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Development", &["Web Development", "Mobile Development", "Game Development"]),
    ("Business", &["Entrepreneurship", "Management"]),
    ("Design", &["Graphic Design", "User Experience"]),
    ("Music", &["Instruments", "Music Production"]),
];

const LANGUAGES: &[&str] = &["English", "Bulgarian", "German", "Spanish", "French"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;
    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", "Site", "Admin", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", "Jane", "Learner", ROLE_USER).await?;
    seed_categories(&orm).await?;
    seed_languages(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    Users::insert(users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        role: Set(role.to_string()),
        shopping_cart_id: Set(None),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(UserCol::Email)
            .update_column(UserCol::Role)
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {email} missing after seed"))?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for (main, subs) in CATEGORIES {
        let parent_id = ensure_category(orm, main, None).await?;
        for sub in *subs {
            ensure_category(orm, sub, Some(parent_id)).await?;
        }
    }
    println!("Seeded categories");
    Ok(())
}

async fn ensure_category(
    orm: &DatabaseConnection,
    name: &str,
    parent_id: Option<i32>,
) -> anyhow::Result<i32> {
    Categories::insert(categories::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        parent_id: Set(parent_id),
    })
    .on_conflict(OnConflict::column(CategoryCol::Name).do_nothing().to_owned())
    .exec_without_returning(orm)
    .await?;

    let category = Categories::find()
        .filter(CategoryCol::Name.eq(name))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {name} missing after seed"))?;
    Ok(category.id)
}

async fn seed_languages(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let rows = LANGUAGES.iter().map(|name| languages::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
    });
    Languages::insert_many(rows)
        .on_conflict(OnConflict::column(LanguageCol::Name).do_nothing().to_owned())
        .exec_without_returning(orm)
        .await?;
    println!("Seeded languages");
    Ok(())
}
