use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "learner@example.com")]
    pub email: String,
    #[schema(min_length = 6)]
    pub password: String,
    #[schema(example = "Grace")]
    pub first_name: String,
    #[schema(example = "Hopper")]
    pub last_name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "learner@example.com")]
    pub email: String,
    pub password: String,
}

/// Bearer token to send back in the `Authorization` header.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Bearer eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
    /// Expiry as a unix timestamp.
    pub expires_at: i64,
}

/// JWT payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub role: String,
    /// Token id, recorded on logout so the token can no longer be used.
    pub jti: String,
    pub exp: usize,
}
