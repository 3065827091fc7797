use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder};

use crate::{
    dto::lookups::{CategoryList, LanguageList},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        languages::{Column as LanguageCol, Entity as Languages, Model as LanguageModel},
    },
    error::AppResult,
    models::{Category, Language},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// All categories, top-level ones first, each group ordered by name.
pub async fn load_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<Category>, DbErr> {
    let mut categories: Vec<Category> = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(db)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    // Stable sort keeps the name order inside each group.
    categories.sort_by_key(|c| c.parent_id.is_some());
    Ok(categories)
}

pub async fn load_languages<C: ConnectionTrait>(db: &C) -> Result<Vec<Language>, DbErr> {
    Ok(Languages::find()
        .order_by_asc(LanguageCol::Name)
        .all(db)
        .await?
        .into_iter()
        .map(language_from_entity)
        .collect())
}

pub async fn main_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = load_categories(&state.orm).await?;
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn languages(state: &AppState) -> AppResult<ApiResponse<LanguageList>> {
    let items = load_languages(&state.orm).await?;
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Languages",
        LanguageList { items },
        Some(meta),
    ))
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        parent_id: model.parent_id,
    }
}

pub fn language_from_entity(model: LanguageModel) -> Language {
    Language {
        id: model.id,
        name: model.name,
    }
}
