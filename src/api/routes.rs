use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/:id",
            get(handlers::download_file).delete(handlers::delete_file),
        )
        // Generic keyed data
        .route(
            "/data/:key",
            get(handlers::get_data)
                .put(handlers::put_data)
                .delete(handlers::delete_data),
        )
        // Backup
        .route("/export", get(handlers::export))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled. Purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
