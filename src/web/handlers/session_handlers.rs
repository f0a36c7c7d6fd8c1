// src/web/handlers/session_handlers.rs
use crate::auth::{AuthConfig, AuthError, AuthenticatedUser, SessionContext};
use crate::web::types::{api_error, ActionResponse, ApiError, DataResponse, LoginRequest, UserInfo};

use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::State;
use tracing::warn;

pub async fn login_handler(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    auth_config: &State<AuthConfig>,
) -> Result<Json<DataResponse<UserInfo>>, ApiError> {
    match auth_config.verify(&request.username, &request.password) {
        Some(user_id) => {
            SessionContext::login(cookies, &user_id);
            let filters = SessionContext::from_cookies(cookies, auth_config).active_filters;
            Ok(Json(DataResponse::success(
                format!("Welcome, {}", user_id),
                UserInfo { user_id, filters },
            )))
        }
        None => {
            warn!("Failed login attempt for {}", request.username);
            Err(api_error(
                Status::Unauthorized,
                AuthError::InvalidCredentials.message().to_string(),
                "INVALID_CREDENTIALS",
                vec!["Check your username and password".to_string()],
            ))
        }
    }
}

pub async fn logout_handler(cookies: &CookieJar<'_>) -> Json<ActionResponse> {
    SessionContext::logout(cookies);
    Json(ActionResponse::success(
        "Logged out".to_string(),
        "logout".to_string(),
    ))
}

pub async fn get_current_user_handler(auth: AuthenticatedUser) -> Json<DataResponse<UserInfo>> {
    let filters = auth.filters().clone();
    Json(DataResponse::success(
        format!("Welcome, {}", auth.user_id()),
        UserInfo {
            user_id: auth.user_id,
            filters,
        },
    ))
}
