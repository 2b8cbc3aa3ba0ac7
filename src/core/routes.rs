// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{account, admin, application, fallback, health};
use crate::stores::kv::KvStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router<K: KvStore + 'static>(state: Arc<AppState<K>>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))

        // Account endpoints
        .route("/register", post(account::register_handler::<K>))
        .route("/login", post(account::login_handler::<K>))
        .route("/logout", post(account::logout_handler::<K>))
        .route("/session", get(account::session_handler::<K>))
        .route("/application", post(application::submit_handler::<K>))

        // Review endpoints (require an admin session)
        .route("/admin/applications", get(admin::list_handler::<K>))
        .route("/admin/applications/{index}/accept", post(admin::accept_handler::<K>))
        .route("/admin/applications/{index}/reject", post(admin::reject_handler::<K>))
        .route("/admin/applications/{index}/delete", post(admin::delete_handler::<K>))

        .fallback(fallback::fallback_handler)

        .with_state(state)
}
