mod common;

use axum::{extract::FromRequestParts, http::Request};
use chrono::{Duration, Utc};
use course_marketplace::{
    dto::auth::{LoginRequest, RegisterRequest},
    entity::{RevokedTokens, revoked_tokens::ActiveModel as RevokedTokenActive},
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    services::auth_service,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

async fn authenticate(state: &AppState, bearer: &str) -> Result<AuthUser, AppError> {
    let (mut parts, _) = Request::builder()
        .uri("/api/cart")
        .header("authorization", bearer)
        .body(())
        .expect("request")
        .into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

#[tokio::test]
async fn register_login_and_logout_revokes_token() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;
    let email = format!("{}@Example.com", common::unique("learner"));

    let user = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.clone(),
            password: "secret123".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(user.email, email.to_lowercase());

    let err = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.clone(),
            password: "secret123".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth_service::login_user(
        state,
        LoginRequest {
            email: email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let login = auth_service::login_user(
        state,
        LoginRequest {
            email: email.clone(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .expect("token");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let auth_user = decode_token(common::TEST_JWT_SECRET, token)?;
    assert_eq!(auth_user.user_id, user.id);

    let extracted = authenticate(state, &login.token).await?;
    assert_eq!(extracted.token_id, auth_user.token_id);

    // A revocation for a token that has already expired.
    let stale = Uuid::new_v4();
    RevokedTokenActive {
        jti: Set(stale),
        user_id: Set(user.id),
        expires_at: Set((Utc::now() - Duration::hours(1)).into()),
    }
    .insert(&state.orm)
    .await?;

    auth_service::logout_user(state, &auth_user).await?;
    assert!(RevokedTokens::find_by_id(stale).one(&state.orm).await?.is_none());
    assert!(
        RevokedTokens::find_by_id(auth_user.token_id)
            .one(&state.orm)
            .await?
            .is_some()
    );
    let err = authenticate(state, &login.token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    // Logging out twice is harmless.
    auth_service::logout_user(state, &auth_user).await?;

    Ok(())
}
