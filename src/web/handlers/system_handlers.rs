// src/web/handlers/system_handlers.rs
use crate::auth::SessionContext;
use crate::tracker::JobTracker;
use crate::web::types::TextResponse;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn health_handler(
    session: SessionContext,
    tracker: &State<JobTracker>,
) -> Json<TextResponse> {
    match &session.user_id {
        Some(user) => info!("Health check by {}", user),
        None => info!("Health check by anonymous user"),
    }

    Json(TextResponse::success(format!(
        "OK (storage: {})",
        tracker.store().backend_name()
    )))
}
