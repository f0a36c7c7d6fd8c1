// src/web/types.rs
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::query::FilterSpec;
use crate::types::JobRecord;

/// Error half of every fallible handler: status plus the standard error body
pub type ApiError = (Status, Json<StandardErrorResponse>);

pub struct CsvResponse {
    pub data: String,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let bytes = self.data.into_bytes();
        Response::build()
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(bytes.len(), std::io::Cursor::new(bytes))
            .ok()
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct FilterRequest {
    pub company: Option<String>,
    pub keyword: Option<String>,
    pub window_days: Option<u32>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UserInfo {
    pub user_id: String,
    pub filters: FilterSpec,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobsView {
    pub filters: FilterSpec,
    pub count: usize,
    pub jobs: Vec<JobRecord>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }

    /// Informational state: the view still renders, with whatever data is available
    pub fn unavailable(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: false,
            message,
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

pub fn api_error(
    status: Status,
    error: String,
    error_code: &str,
    suggestions: Vec<String>,
) -> ApiError {
    (
        status,
        Json(StandardErrorResponse::new(
            error,
            error_code.to_string(),
            suggestions,
        )),
    )
}
