use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, Language};

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LanguageList {
    pub items: Vec<Language>,
}
