//! Administrator routes.
//!
//! Mounted behind `require_admin`. Besides the unscoped resource routes this
//! module serves user management under `/admin/users`.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use validator::Validate;

use super::resources::admin_routes;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{IdPath, ValidatedJson},
    middleware::require_admin,
};
use pennywise_core::budget::Budget;
use pennywise_core::expense::Expense;
use pennywise_core::notification::Notification;
use pennywise_core::user::{AdminUserUpdate, Gender, ProfileUpdate, Registration, User};
use pennywise_shared::auth::Role;
use pennywise_shared::types::UserId;

/// Creates the admin router, role check included.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(admin_routes::<Budget>())
        .merge(admin_routes::<Expense>())
        .merge(admin_routes::<Notification>())
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(middleware::from_fn(require_admin))
}

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Email; normalized to lower case.
    #[validate(length(max = 254))]
    pub email: String,
    /// Initial password.
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
    /// Account role; `user` when omitted.
    #[serde(default)]
    pub role: Role,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// Must equal the path id.
    #[serde(rename = "userID")]
    pub id: Option<UserId>,
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
    /// New role; unchanged when omitted.
    pub role: Option<Role>,
    /// New password; reset through the credential path.
    pub password: Option<String>,
    /// Expected concurrency token.
    pub version: Option<i32>,
}

impl From<UpdateUserRequest> for AdminUserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            id: request.id,
            profile: ProfileUpdate {
                email: request.email,
                first_name: request.first_name,
                last_name: request.last_name,
                gender: request.gender,
                version: request.version,
            },
            role: request.role,
            password: request.password,
        }
    }
}

/// GET /admin/users
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.user_service().list().await?))
}

/// GET /admin/users/{id}
async fn get_user(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Json<User>> {
    Ok(Json(state.user_service().get(UserId::new(id)).await?))
}

/// POST /admin/users - Goes through registration, so the password is hashed.
async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<Response> {
    let registration = Registration {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        gender: payload.gender,
        role: payload.role,
    };
    let user = state
        .user_service()
        .create(registration, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/admin/users/{}", user.id))],
        Json(user),
    )
        .into_response())
}

/// PUT /admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .user_service()
        .update(UserId::new(id), payload.into())
        .await?;
    Ok(Json(user))
}

/// DELETE /admin/users/{id} - Cascades to everything the user owns.
async fn delete_user(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<StatusCode> {
    state.user_service().delete(UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
