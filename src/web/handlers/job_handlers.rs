// src/web/handlers/job_handlers.rs
use crate::auth::{AuthenticatedUser, SessionContext};
use crate::export::to_csv;
use crate::query::{FilterSpec, Insights};
use crate::tracker::{JobTracker, NewJob, TrackerError};
use crate::types::records::now_seconds;
use crate::types::JobRecord;
use crate::web::types::{
    api_error, ActionResponse, ApiError, CsvResponse, DataResponse, FilterRequest, JobsView,
};

use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

/// Map a pipeline failure to a response the caller can show
pub fn tracker_error(e: TrackerError) -> ApiError {
    match e {
        TrackerError::Validation(message) => api_error(
            Status::BadRequest,
            message,
            "VALIDATION_ERROR",
            vec!["Complete the required fields and submit again".to_string()],
        ),
        TrackerError::Storage(e) => {
            error!("Storage failure: {:#}", e);
            api_error(
                Status::ServiceUnavailable,
                format!("Storage unavailable: {}", e),
                "STORAGE_UNAVAILABLE",
                vec!["Try again in a few moments".to_string()],
            )
        }
    }
}

/// Session filters, overridden by any values given on the query string
pub fn effective_filters(
    session: &FilterSpec,
    company: Option<String>,
    keyword: Option<String>,
    days: Option<u32>,
) -> FilterSpec {
    FilterSpec::new(
        company.or_else(|| session.company.clone()),
        keyword.or_else(|| session.keyword.clone()),
        days.unwrap_or(session.window_days),
    )
}

pub async fn submit_job_handler(
    request: Json<NewJob>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<JobRecord>>, ApiError> {
    info!("User {} submitting job {}", auth.user_id(), request.job_link);

    let record = tracker
        .submit_job(auth.user_id(), request.into_inner())
        .await
        .map_err(tracker_error)?;

    Ok(Json(DataResponse::success(
        "Job added successfully!".to_string(),
        record,
    )))
}

pub async fn list_jobs_handler(
    company: Option<String>,
    keyword: Option<String>,
    days: Option<u32>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<JobsView>>, ApiError> {
    let filters = effective_filters(auth.filters(), company, keyword, days);

    match tracker
        .filtered_jobs(auth.user_id(), &filters, now_seconds())
        .await
    {
        Ok(jobs) => Ok(Json(DataResponse::success(
            format!("Showing {} Jobs", jobs.len()),
            JobsView {
                filters,
                count: jobs.len(),
                jobs,
            },
        ))),
        Err(TrackerError::Storage(e)) => {
            error!("Error loading job data for {}: {:#}", auth.user_id(), e);
            Ok(Json(DataResponse::unavailable(
                format!("Error loading job data: {}", e),
                JobsView {
                    filters,
                    count: 0,
                    jobs: Vec::new(),
                },
            )))
        }
        Err(e) => Err(tracker_error(e)),
    }
}

pub async fn export_jobs_handler(
    company: Option<String>,
    keyword: Option<String>,
    days: Option<u32>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<CsvResponse, ApiError> {
    let filters = effective_filters(auth.filters(), company, keyword, days);

    let jobs = tracker
        .filtered_jobs(auth.user_id(), &filters, now_seconds())
        .await
        .map_err(tracker_error)?;

    let data = to_csv(&jobs).map_err(|e| tracker_error(TrackerError::Storage(e)))?;

    Ok(CsvResponse {
        data,
        filename: "filtered_jobs.csv".to_string(),
    })
}

pub async fn save_filters_handler(
    request: Json<FilterRequest>,
    auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<DataResponse<FilterSpec>> {
    let request = request.into_inner();
    let filters = FilterSpec::new(
        request.company,
        request.keyword,
        request.window_days.unwrap_or(auth.filters().window_days),
    );

    SessionContext::save_filters(cookies, &filters);
    Json(DataResponse::success("Filters applied".to_string(), filters))
}

pub async fn reset_filters_handler(
    _auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<ActionResponse> {
    SessionContext::reset_filters(cookies);
    Json(ActionResponse::success(
        "Filters reset".to_string(),
        "reset_filters".to_string(),
    ))
}

pub async fn insights_handler(
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<Insights>>, ApiError> {
    let now = now_seconds();

    match tracker.insights(auth.user_id(), now).await {
        Ok(insights) => Ok(Json(DataResponse::success(
            format!("{} Jobs tracked", insights.total),
            insights,
        ))),
        Err(TrackerError::Storage(e)) => {
            error!("Error loading dashboard data for {}: {:#}", auth.user_id(), e);
            Ok(Json(DataResponse::unavailable(
                format!("Error loading dashboard data: {}", e),
                crate::query::build_insights(&[], now),
            )))
        }
        Err(e) => Err(tracker_error(e)),
    }
}
