//! Generic handlers for owner-scoped resources.
//!
//! Budgets, expenses and notifications are served by the same five handlers.
//! Each resource supplies its collection path, its request body type and the
//! store it lives in through [`ResourceRoute`]; the handlers do the rest.
//!
//! Regular routes scope every query to the caller. Admin routes are mounted
//! behind `require_admin`, so the caller's scope there is already unscoped;
//! only listing and creation need admin-specific handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{IdPath, ValidatedJson},
    middleware::AuthUser,
};
use pennywise_core::resource::Update;
use pennywise_core::{Resource, ResourceStore, Scope, ScopedService};
use pennywise_shared::types::{Amount, UserId};
use pennywise_shared::{AppError, AppResult};

/// Request body for creating or updating a resource.
pub trait Payload<R: Resource>: DeserializeOwned + Validate + Send + 'static {
    /// Id repeated in the body (`budgetID`, ...).
    fn body_id(&self) -> Option<R::Id>;

    /// Owner named in the body. Honored on admin creates only.
    fn body_owner(&self) -> Option<UserId>;

    /// Expected concurrency token.
    fn body_version(&self) -> Option<i32>;

    /// Converts the writable fields into a draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for missing or unparseable fields.
    fn into_draft(self) -> AppResult<R::Draft>;
}

/// A resource exposed over HTTP.
pub trait ResourceRoute: Resource + Serialize {
    /// Collection path segment, without slashes.
    const PATH: &'static str;

    /// Request body.
    type Payload: Payload<Self>;

    /// The store holding this resource.
    fn store(state: &AppState) -> Arc<dyn ResourceStore<Self>>;
}

/// Parses a required amount field.
pub(crate) fn required_amount(value: Option<Decimal>) -> AppResult<Amount> {
    let value = value.ok_or_else(|| AppError::Validation("amount is required".to_string()))?;
    Amount::new(value).map_err(|e| AppError::Validation(e.to_string()))
}

/// Unwraps a required field.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// `GET/POST /{path}` and `GET/PUT/DELETE /{path}/{id}`, scoped to the caller.
pub fn routes<R: ResourceRoute>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", R::PATH), get(list::<R>).post(create::<R>))
        .route(
            &format!("/{}/{{id}}", R::PATH),
            get(get_one::<R>).put(update::<R>).delete(delete::<R>),
        )
}

/// The same operations under `/admin`, unscoped. Mount behind `require_admin`.
pub fn admin_routes<R: ResourceRoute>() -> Router<AppState> {
    Router::new()
        .route(
            &format!("/admin/{}", R::PATH),
            get(admin_list::<R>).post(admin_create::<R>),
        )
        .route(
            &format!("/admin/{}/{{id}}", R::PATH),
            get(get_one::<R>).put(update::<R>).delete(delete::<R>),
        )
}

fn service<R: ResourceRoute>(state: &AppState) -> ScopedService<R> {
    ScopedService::new(R::store(state), Arc::clone(&state.clock))
}

fn created<R: ResourceRoute>(location: String, row: R) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(row),
    )
        .into_response()
}

/// GET /{path} - The caller's own rows.
async fn list<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<R>>> {
    Ok(Json(service::<R>(&state).list(caller.own()).await?))
}

/// GET /{path}/{id}
async fn get_one<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<R>> {
    let row = service::<R>(&state)
        .get(caller.scope(), R::Id::from(id))
        .await?;
    Ok(Json(row))
}

/// POST /{path} - The owner is always the caller; a body `userID` is ignored.
async fn create<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(payload): ValidatedJson<R::Payload>,
) -> ApiResult<Response> {
    if let Some(owner) = payload.body_owner().filter(|owner| *owner != caller.user_id) {
        debug!(user_id = %caller.user_id, body_owner = %owner, "Ignoring body owner");
    }
    let draft = payload.into_draft()?;
    let row = service::<R>(&state).create(caller.user_id, draft).await?;
    Ok(created(format!("/{}/{}", R::PATH, row.id()), row))
}

/// PUT /{path}/{id}
async fn update<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<R::Payload>,
) -> ApiResult<Json<R>> {
    let update = Update {
        id: payload.body_id(),
        version: payload.body_version(),
        draft: payload.into_draft()?,
    };
    let row = service::<R>(&state)
        .update(caller.scope(), R::Id::from(id), update)
        .await?;
    Ok(Json(row))
}

/// DELETE /{path}/{id}
async fn delete<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<StatusCode> {
    service::<R>(&state)
        .delete(caller.scope(), R::Id::from(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/{path} - Every row.
async fn admin_list<R: ResourceRoute>(State(state): State<AppState>) -> ApiResult<Json<Vec<R>>> {
    Ok(Json(service::<R>(&state).list(Scope::All).await?))
}

/// POST /admin/{path} - Honors the body `userID`, defaulting to the caller.
async fn admin_create<R: ResourceRoute>(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(payload): ValidatedJson<R::Payload>,
) -> ApiResult<Response> {
    let owner = payload.body_owner().unwrap_or(caller.user_id);
    let draft = payload.into_draft()?;
    let row = service::<R>(&state).create(owner, draft).await?;
    Ok(created(format!("/admin/{}/{}", R::PATH, row.id()), row))
}
