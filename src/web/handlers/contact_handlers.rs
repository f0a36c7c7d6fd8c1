// src/web/handlers/contact_handlers.rs
use crate::auth::AuthenticatedUser;
use crate::tracker::{JobTracker, NewContact, TrackerError};
use crate::types::ContactRecord;
use crate::web::handlers::job_handlers::tracker_error;
use crate::web::types::{ApiError, DataResponse};

use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn log_contact_handler(
    request: Json<NewContact>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<ContactRecord>>, ApiError> {
    info!("User {} logging contact for {}", auth.user_id(), request.company);

    let record = tracker
        .log_contact(auth.user_id(), request.into_inner())
        .await
        .map_err(tracker_error)?;

    Ok(Json(DataResponse::success(
        "Contact logged successfully!".to_string(),
        record,
    )))
}

/// Contacts, newest first
pub async fn list_contacts_handler(
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<Vec<ContactRecord>>>, ApiError> {
    match tracker.contacts(auth.user_id()).await {
        Ok(contacts) if contacts.is_empty() => Ok(Json(DataResponse::success(
            "No contacts logged yet.".to_string(),
            contacts,
        ))),
        Ok(contacts) => Ok(Json(DataResponse::success(
            format!("{} contacts logged", contacts.len()),
            contacts,
        ))),
        Err(TrackerError::Storage(e)) => {
            error!("Error loading contacts for {}: {:#}", auth.user_id(), e);
            Ok(Json(DataResponse::unavailable(
                format!("Error loading contacts: {}", e),
                Vec::new(),
            )))
        }
        Err(e) => Err(tracker_error(e)),
    }
}
