//! The caller's own account.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use validator::Validate;

use crate::{AppState, error::ApiResult, extractors::ValidatedJson, middleware::AuthUser};
use pennywise_core::user::{Gender, ProfileUpdate, User};
use pennywise_shared::auth::ChangePasswordRequest;

/// Creates the profile routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/profile/change-password", put(change_password))
}

/// Request body for `PUT /user/profile`. Omitted names and gender are cleared.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    /// Email; must stay unique.
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: String,
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
    /// Expected concurrency token.
    pub version: Option<i32>,
}

impl From<ProfilePayload> for ProfileUpdate {
    fn from(payload: ProfilePayload) -> Self {
        Self {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            gender: payload.gender,
            version: payload.version,
        }
    }
}

/// GET /user/profile
async fn get_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.user_service().profile(caller.user_id).await?))
}

/// PUT /user/profile - Also records a "profile updated" notification.
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(payload): ValidatedJson<ProfilePayload>,
) -> ApiResult<Json<User>> {
    let user = state
        .user_service()
        .update_profile(caller.user_id, payload.into())
        .await?;
    Ok(Json(user))
}

/// PUT /user/profile/change-password
async fn change_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth_service()
        .change_password(
            caller.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
