// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::auth::{AuthConfig, AuthenticatedUser, SessionContext};
use crate::config::{EnvironmentConfig, Secrets};
use crate::query::{FilterSpec, Insights};
use crate::tracker::{JobTracker, NewContact, NewJob};
use crate::types::{ContactRecord, JobRecord};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{CookieJar, Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[get("/health")]
pub async fn health(session: SessionContext, tracker: &State<JobTracker>) -> Json<TextResponse> {
    handlers::health_handler(session, tracker).await
}

#[post("/login", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    auth_config: &State<AuthConfig>,
) -> Result<Json<DataResponse<UserInfo>>, ApiError> {
    handlers::login_handler(request, cookies, auth_config).await
}

#[post("/logout")]
pub async fn logout(cookies: &CookieJar<'_>) -> Json<ActionResponse> {
    handlers::logout_handler(cookies).await
}

#[get("/me")]
pub async fn get_current_user(auth: AuthenticatedUser) -> Json<DataResponse<UserInfo>> {
    handlers::get_current_user_handler(auth).await
}

#[post("/jobs", data = "<request>")]
pub async fn submit_job(
    request: Json<NewJob>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<JobRecord>>, ApiError> {
    handlers::submit_job_handler(request, auth, tracker).await
}

#[get("/jobs?<company>&<keyword>&<days>")]
pub async fn list_jobs(
    company: Option<String>,
    keyword: Option<String>,
    days: Option<u32>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<JobsView>>, ApiError> {
    handlers::list_jobs_handler(company, keyword, days, auth, tracker).await
}

#[get("/jobs/export?<company>&<keyword>&<days>")]
pub async fn export_jobs(
    company: Option<String>,
    keyword: Option<String>,
    days: Option<u32>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<CsvResponse, ApiError> {
    handlers::export_jobs_handler(company, keyword, days, auth, tracker).await
}

#[post("/jobs/filters", data = "<request>")]
pub async fn save_filters(
    request: Json<FilterRequest>,
    auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<DataResponse<FilterSpec>> {
    handlers::save_filters_handler(request, auth, cookies).await
}

#[post("/jobs/filters/reset")]
pub async fn reset_filters(
    auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<ActionResponse> {
    handlers::reset_filters_handler(auth, cookies).await
}

#[get("/insights")]
pub async fn insights(
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<Insights>>, ApiError> {
    handlers::insights_handler(auth, tracker).await
}

#[post("/contacts", data = "<request>")]
pub async fn log_contact(
    request: Json<NewContact>,
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<ContactRecord>>, ApiError> {
    handlers::log_contact_handler(request, auth, tracker).await
}

#[get("/contacts")]
pub async fn list_contacts(
    auth: AuthenticatedUser,
    tracker: &State<JobTracker>,
) -> Result<Json<DataResponse<Vec<ContactRecord>>>, ApiError> {
    handlers::list_contacts_handler(auth, tracker).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Login required".to_string(),
        "NOT_LOGGED_IN".to_string(),
        vec!["Log in with your username and the shared password".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body is missing required fields".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec!["Verify all required fields are present".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    ))
}

/// Assemble the API without launching it
pub fn build_rocket(tracker: JobTracker, auth_config: AuthConfig, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .attach(Cors)
        .manage(tracker)
        .manage(auth_config)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                login,
                logout,
                get_current_user,
                submit_job,
                list_jobs,
                export_jobs,
                save_filters,
                reset_filters,
                insights,
                log_contact,
                list_contacts,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: EnvironmentConfig, secrets: Secrets) -> Result<()> {
    let tracker = crate::build_tracker(&config, &secrets)?;
    let auth_config = AuthConfig::new(config.allowed_users.clone(), secrets.app_password);

    info!("Starting job tracker API server");
    info!("Storage backend: {}", tracker.store().backend_name());
    info!("Company extraction: {:?}", tracker.company_strategy());
    info!("Server: http://0.0.0.0:{}", config.port);

    if let Err(e) = build_rocket(tracker, auth_config, config.port).launch().await {
        error!("Server stopped with error: {}", e);
        return Err(anyhow::anyhow!("Server failed: {}", e));
    }

    Ok(())
}
