use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{dto::auth::Claims, entity::RevokedTokens, error::AppError, state::AppState};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
    pub token_id: Uuid,
    /// Expiry of the presented token, as a unix timestamp.
    pub expires_at: i64,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Validates a bearer token's signature and expiry.
pub fn decode_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let token_id = Uuid::parse_str(&decoded.claims.jti)
        .map_err(|_| AppError::Unauthorized("Invalid token id".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
        token_id,
        expires_at: decoded.claims.exp as i64,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let user = decode_token(&state.jwt_secret, token)?;

        if RevokedTokens::find_by_id(user.token_id)
            .one(&state.orm)
            .await?
            .is_some()
        {
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            token_id: Uuid::new_v4(),
            expires_at: 0,
        }
    }

    #[test]
    fn only_admin_role_is_admin() {
        assert!(user(ROLE_ADMIN).is_admin());
        assert!(!user(ROLE_USER).is_admin());
        assert!(!user("Admin").is_admin());
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        assert!(matches!(
            decode_token("secret", "not.a.jwt"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
