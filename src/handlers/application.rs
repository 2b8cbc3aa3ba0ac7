use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{ApplicationForm, ApplicationResponse};
use crate::stores::kv::KvStore;
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Submit the logged-in user's staff application
///
/// POST /application (why, experience, age, mc_username)
pub async fn submit_handler<K: KvStore>(
    State(state): State<Arc<AppState<K>>>,
    form: Result<Form<ApplicationForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let current_user = state.store.current_user()?;

    let application = match state
        .store
        .submit_application(current_user.as_deref(), form.into())
    {
        Ok(application) => application,
        Err(e) => {
            warn!(username = ?current_user, error = %e, "Application rejected");
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            success: true,
            message: "Application submitted successfully".to_string(),
            application,
        }),
    )
        .into_response())
}
