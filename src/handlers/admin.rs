use crate::core::error::{ApiError, StoreError};
use crate::core::state::AppState;
use crate::models::api::{ApplicationEntry, ApplicationListResponse, SuccessResponse};
use crate::models::application::Verdict;
use crate::models::session::Session;
use crate::stores::kv::KvStore;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Resolve the session and insist it belongs to an admin
fn require_admin<K: KvStore>(state: &AppState<K>) -> Result<Session, ApiError> {
    match state.store.session()? {
        Some(session) if session.is_admin() => Ok(session),
        Some(session) => {
            warn!(username = %session.username, "Non-admin attempted a review action");
            Err(ApiError::Forbidden)
        }
        None => Err(StoreError::NotAuthenticated.into()),
    }
}

/// List every application with its review index
///
/// GET /admin/applications
pub async fn list_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
) -> Result<Response, ApiError> {
    require_admin(&*state)?;

    let applications = state
        .store
        .load_applications()?
        .into_iter()
        .enumerate()
        .map(|(index, application)| ApplicationEntry { index, application })
        .collect();

    Ok((
        StatusCode::OK,
        Json(ApplicationListResponse {
            success: true,
            applications,
        }),
    )
        .into_response())
}

fn review<K: KvStore>(
    state: &AppState<K>,
    index: usize,
    verdict: Verdict,
) -> Result<Response, ApiError> {
    let session = require_admin(state)?;

    let application = match state.store.set_application_status(index, verdict) {
        Ok(application) => application,
        Err(e) => {
            warn!(admin = %session.username, index = index, error = %e, "Review rejected");
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!(
                "Application from {} marked {}",
                application.username, application.status
            ),
        }),
    )
        .into_response())
}

/// POST /admin/applications/{index}/accept
pub async fn accept_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(index) = index?;
    review(&*state, index, Verdict::Accept)
}

/// POST /admin/applications/{index}/reject
pub async fn reject_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(index) = index?;
    review(&*state, index, Verdict::Reject)
}

/// Permanently remove an application, whatever its status
///
/// POST /admin/applications/{index}/delete
pub async fn delete_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(index) = index?;
    let session = require_admin(&*state)?;

    let removed = match state.store.delete_application(index) {
        Ok(removed) => removed,
        Err(e) => {
            warn!(admin = %session.username, index = index, error = %e, "Delete rejected");
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!("Application from {} deleted", removed.username),
        }),
    )
        .into_response())
}
