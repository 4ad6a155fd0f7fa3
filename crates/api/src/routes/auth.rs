//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::Validate;

use crate::{AppState, error::ApiResult, extractors::ValidatedJson};
use pennywise_core::user::{Gender, Registration, User};
use pennywise_shared::AppError;
use pennywise_shared::auth::{LoginRequest, Role};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

/// Self sign-up payload.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email; normalized to lower case.
    #[validate(length(max = 254))]
    pub email: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
    /// Given name.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub last_name: String,
    /// Self-described gender.
    #[serde(default)]
    pub gender: Gender,
}

/// Successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// The authenticated account.
    pub user: User,
}

/// POST /auth/register - Create an account with the `user` role.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<User>> {
    let registration = Registration {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        gender: payload.gender,
        role: Role::User,
    };
    let user = state
        .auth_service()
        .register(registration, &payload.password)
        .await?;
    Ok(Json(user))
}

/// POST /auth/login - Authenticate and issue an access token.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    let token = state
        .jwt_service
        .generate_access_token(user.id, user.role)
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "Failed to generate access token");
            AppError::Internal("token generation failed".to_string())
        })?;

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt_service.access_token_expires_in(),
        user,
    }))
}
