use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        revoked_tokens::{ActiveModel as RevokedTokenActive, Column as RevokedCol},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
        RevokedTokens,
    },
    error::{AppError, AppResult, FieldError},
    middleware::auth::{AuthUser, ROLE_USER},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;
const MIN_PASSWORD_LEN: usize = 6;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        first_name,
        last_name,
    } = payload;
    let email = email.trim().to_lowercase();
    validate_registration(&email, &password, &first_name, &last_name)?;

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        role: Set(ROLE_USER.to_string()),
        shopping_cart_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", user_from_entity(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let (token, expires_at) = issue_token(&state.jwt_secret, user.id, &user.role)?;
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        expires_at,
    };

    audit::record(
        state,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}

/// Revokes the token the caller authenticated with.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let expires_at = DateTime::<Utc>::from_timestamp(user.expires_at, 0)
        .unwrap_or_else(Utc::now);

    RevokedTokens::insert(RevokedTokenActive {
        jti: Set(user.token_id),
        user_id: Set(user.user_id),
        expires_at: Set(expires_at.into()),
    })
    .on_conflict(OnConflict::column(RevokedCol::Jti).do_nothing().to_owned())
    .exec_without_returning(&state.orm)
    .await?;

    let pruned = prune_revoked_tokens(&state.orm).await?;
    if pruned > 0 {
        tracing::debug!(pruned, "expired token revocations removed");
    }

    audit::record(
        state,
        Some(user.user_id),
        "user_logout",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::done("Logged out"))
}

/// Deletes revocations whose token has expired anyway.
pub async fn prune_revoked_tokens<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let result = RevokedTokens::delete_many()
        .filter(RevokedCol::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Signs a fresh token and returns it with its expiry timestamp.
pub fn issue_token(secret: &str, user_id: Uuid, role: &str) -> AppResult<(String, i64)> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok((token, expiration.timestamp()))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn validate_registration(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> AppResult<()> {
    let mut errors = Vec::new();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "First name is required"));
    }
    if last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "Last name is required"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    #[test]
    fn issued_token_identifies_user() {
        let user_id = Uuid::new_v4();
        let (token, expires_at) = issue_token("secret", user_id, "user").unwrap();

        let user = decode_token("secret", &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, "user");
        assert_eq!(user.expires_at, expires_at);
        assert!(expires_at > Utc::now().timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = issue_token("secret", Uuid::new_v4(), "user").unwrap();
        assert!(matches!(
            decode_token("another-secret", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn every_token_gets_its_own_id() {
        let user_id = Uuid::new_v4();
        let first = decode_token("s", &issue_token("s", user_id, "user").unwrap().0).unwrap();
        let second = decode_token("s", &issue_token("s", user_id, "user").unwrap().0).unwrap();
        assert_ne!(first.token_id, second.token_id);
    }

    #[test]
    fn registration_reports_each_bad_field() {
        let err = validate_registration("nope", "123", " ", "Doe").unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["email", "password", "first_name"]);
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("hunter22").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"hunter22", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
