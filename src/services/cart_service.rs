use std::collections::HashMap;

use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartList, CheckoutResult},
    entity::{
        courses::{Entity as Courses, Model as CourseModel},
        enrollments::{
            ActiveModel as EnrollmentActive, Column as EnrollmentCol, Entity as Enrollments,
        },
        shopping_cart_courses::{
            ActiveModel as CartCourseActive, Column as CartCourseCol, Entity as CartCourses,
        },
        shopping_carts::{
            ActiveModel as CartActive, Column as CartCol, Entity as ShoppingCarts,
        },
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartCourse, file_url},
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn find_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

async fn find_active_course<C: ConnectionTrait>(db: &C, course_id: Uuid) -> AppResult<CourseModel> {
    Courses::find_by_id(course_id)
        .one(db)
        .await?
        .filter(|course| !course.is_deleted)
        .ok_or(AppError::NotFound)
}

/// Returns the user's cart id, creating and linking the cart on first use.
async fn ensure_cart(txn: &DatabaseTransaction, user: &UserModel) -> AppResult<Uuid> {
    if let Some(cart_id) = user.shopping_cart_id {
        return Ok(cart_id);
    }

    ShoppingCarts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(txn)
    .await?;

    let cart = ShoppingCarts::find()
        .filter(CartCol::UserId.eq(user.id))
        .one(txn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("shopping cart missing after insert")))?;

    Users::update_many()
        .col_expr(UserCol::ShoppingCartId, Expr::value(cart.id))
        .filter(UserCol::Id.eq(user.id))
        .exec(txn)
        .await?;

    tracing::debug!(user_id = %user.id, cart_id = %cart.id, "shopping cart created");
    Ok(cart.id)
}

pub async fn add_course(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let owner = find_user(&state.orm, user.user_id).await?;
    let course = find_active_course(&state.orm, payload.course_id).await?;

    if course.creator_id == owner.id {
        return Err(AppError::BadRequest(
            "cannot add your own course to the cart".to_string(),
        ));
    }
    let enrolled = Enrollments::find()
        .filter(EnrollmentCol::UserId.eq(owner.id))
        .filter(EnrollmentCol::CourseId.eq(course.id))
        .count(&state.orm)
        .await?;
    if enrolled > 0 {
        return Err(AppError::BadRequest(
            "already enrolled in this course".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;
    let cart_id = ensure_cart(&txn, &owner).await?;

    // The composite key makes the cart a set: a second add is a no-op.
    CartCourses::insert(CartCourseActive {
        shopping_cart_id: Set(cart_id),
        course_id: Set(course.id),
        added_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([CartCourseCol::ShoppingCartId, CartCourseCol::CourseId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "cart_add",
        "shopping_cart_courses",
        serde_json::json!({ "course_id": course.id }),
    )
    .await;

    list_cart(state, user).await
}

pub async fn remove_course(
    state: &AppState,
    user: &AuthUser,
    course_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let owner = find_user(&state.orm, user.user_id).await?;
    let course = Courses::find_by_id(course_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let cart_id = owner.shopping_cart_id.ok_or(AppError::NotFound)?;

    let result = CartCourses::delete_many()
        .filter(CartCourseCol::ShoppingCartId.eq(cart_id))
        .filter(CartCourseCol::CourseId.eq(course.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "cart_remove",
        "shopping_cart_courses",
        serde_json::json!({ "course_id": course_id }),
    )
    .await;

    Ok(ApiResponse::done("Removed from cart"))
}

/// Empties the cart; the cart record itself is kept.
pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let owner = find_user(&state.orm, user.user_id).await?;

    let removed = match owner.shopping_cart_id {
        Some(cart_id) => {
            CartCourses::delete_many()
                .filter(CartCourseCol::ShoppingCartId.eq(cart_id))
                .exec(&state.orm)
                .await?
                .rows_affected
        }
        None => 0,
    };

    audit::record(
        state,
        Some(user.user_id),
        "cart_clear",
        "shopping_cart_courses",
        serde_json::json!({ "removed": removed }),
    )
    .await;

    Ok(ApiResponse::done("Cart cleared"))
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let owner = find_user(&state.orm, user.user_id).await?;
    let items = match owner.shopping_cart_id {
        Some(cart_id) => cart_courses(&state.orm, cart_id).await?,
        None => Vec::new(),
    };

    let total_price = items.iter().map(|c| c.price).sum();
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "OK",
        CartList { items, total_price },
        Some(meta),
    ))
}

/// Enrolls the user in every course in the cart and empties it.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutResult>> {
    let owner = find_user(&state.orm, user.user_id).await?;
    let cart_id = owner
        .shopping_cart_id
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let txn = state.orm.begin().await?;
    let courses = cart_courses(&txn, cart_id).await?;
    if courses.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let enrollments = courses.iter().map(|course| EnrollmentActive {
        user_id: Set(owner.id),
        course_id: Set(course.id),
        created_at: NotSet,
    });
    Enrollments::insert_many(enrollments)
        .on_conflict(
            OnConflict::columns([EnrollmentCol::UserId, EnrollmentCol::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    CartCourses::delete_many()
        .filter(CartCourseCol::ShoppingCartId.eq(cart_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let enrolled_course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let total_price = courses.iter().map(|c| c.price).sum();

    audit::record(
        state,
        Some(user.user_id),
        "checkout",
        "enrollments",
        serde_json::json!({ "course_ids": enrolled_course_ids, "total_price": total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Enrolled",
        CheckoutResult {
            enrolled_course_ids,
            total_price,
        },
        Some(Meta::empty()),
    ))
}

/// Courses in a cart, oldest addition first. Deleted courses are left out.
async fn cart_courses<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> AppResult<Vec<CartCourse>> {
    let rows = CartCourses::find()
        .filter(CartCourseCol::ShoppingCartId.eq(cart_id))
        .order_by_asc(CartCourseCol::AddedAt)
        .find_also_related(Courses)
        .all(db)
        .await?;

    let courses: Vec<CourseModel> = rows
        .into_iter()
        .filter_map(|(_, course)| course)
        .filter(|course| !course.is_deleted)
        .collect();

    let creator_ids: Vec<Uuid> = courses.iter().map(|c| c.creator_id).collect();
    let creators: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(creator_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name()))
        .collect();

    Ok(courses
        .into_iter()
        .map(|course| CartCourse {
            id: course.id,
            creator_full_name: creators.get(&course.creator_id).cloned().unwrap_or_default(),
            image_url: file_url(course.image_source_id),
            name: course.title,
            price: course.price,
        })
        .collect())
}
