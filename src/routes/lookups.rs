use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::lookups::{CategoryList, LanguageList},
    error::AppResult,
    response::ApiResponse,
    services::lookup_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/languages", get(list_languages))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories, main categories first", body = ApiResponse<CategoryList>)
    ),
    tag = "Lookups"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(lookup_service::main_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/languages",
    responses(
        (status = 200, description = "Course languages", body = ApiResponse<LanguageList>)
    ),
    tag = "Lookups"
)]
pub async fn list_languages(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<LanguageList>>> {
    Ok(Json(lookup_service::languages(&state).await?))
}
