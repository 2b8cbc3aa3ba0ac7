use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{LoginForm, RegisterForm, SessionResponse, SuccessResponse};
use crate::stores::kv::KvStore;
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Create an account
///
/// POST /register (username, email, password)
pub async fn register_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let form = form.normalized();

    if let Err(e) = state
        .store
        .register(&form.username, &form.email, &form.password)
    {
        warn!(username = %form.username, error = %e, "Registration rejected");
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            message: "Registration successful".to_string(),
        }),
    )
        .into_response())
}

/// Log in and set the session pointer
///
/// POST /login (username, password)
pub async fn login_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let username = form.username.trim();

    let user = match state.store.authenticate(username, &form.password) {
        Ok(user) => user,
        Err(e) => {
            warn!(username = %username, error = %e, "Login rejected");
            return Err(e.into());
        }
    };

    let admin = state.store.admins().is_admin(&user.username);

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            logged_in: true,
            username: Some(user.username),
            admin,
        }),
    )
        .into_response())
}

/// Clear the session pointer
///
/// POST /logout
pub async fn logout_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
) -> Result<Response, ApiError> {
    let previous = state.store.current_user()?;
    state.store.clear_current_user()?;

    info!(username = ?previous, "User logged out");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

/// Who is logged in, and whether the review pages should be shown
///
/// GET /session
pub async fn session_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
) -> Result<Response, ApiError> {
    let response = match state.store.session()? {
        Some(session) => SessionResponse {
            logged_in: true,
            admin: session.is_admin(),
            username: Some(session.username),
        },
        None => SessionResponse {
            logged_in: false,
            username: None,
            admin: false,
        },
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
