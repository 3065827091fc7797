use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartCourse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartCourse>,
    pub total_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResult {
    pub enrolled_course_ids: Vec<Uuid>,
    pub total_price: i64,
}
