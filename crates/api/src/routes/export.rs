//! CSV download of a user's data.

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{AppState, error::ApiResult, extractors::IdPath, middleware::AuthUser};
use pennywise_core::Caller;
use pennywise_shared::types::UserId;

/// Creates the export routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/csv/download", get(download_own))
        .route("/csv/download/{user_id}", get(download_for_user))
}

/// GET /csv/download - The caller's own report.
async fn download_own(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Response> {
    download(&state, caller, caller.user_id).await
}

/// GET /csv/download/{user_id} - Own id, or any id for administrators.
async fn download_for_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    IdPath(user_id): IdPath,
) -> ApiResult<Response> {
    download(&state, caller, UserId::new(user_id)).await
}

async fn download(state: &AppState, caller: Caller, target: UserId) -> ApiResult<Response> {
    let report = state.export_service().export(caller, target).await?;
    let disposition = format!("attachment; filename=\"{}\"", report.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    )
        .into_response())
}
