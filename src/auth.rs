// src/auth.rs
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use tracing::{info, warn};

use crate::query::FilterSpec;

pub const USER_COOKIE: &str = "job_tracker_user";
pub const FILTERS_COOKIE: &str = "job_tracker_filters";

/// Fixed allow-list plus one shared password
pub struct AuthConfig {
    allowed_users: Vec<String>,
    shared_secret: String,
}

impl AuthConfig {
    pub fn new(allowed_users: Vec<String>, shared_secret: String) -> Self {
        Self {
            allowed_users,
            shared_secret,
        }
    }

    /// Returns the identity to use as the storage partition key
    pub fn verify(&self, username: &str, password: &str) -> Option<String> {
        let username = username.trim();
        let known = self.allowed_users.iter().any(|u| u == username);

        if known && !self.shared_secret.is_empty() && password == self.shared_secret {
            Some(username.to_string())
        } else {
            None
        }
    }
}

/// Per-request view of the session, rebuilt from private cookies
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub active_filters: FilterSpec,
}

impl SessionContext {
    pub fn from_cookies(cookies: &CookieJar<'_>, auth_config: &AuthConfig) -> Self {
        // A cookie for a user removed from the allow-list no longer counts
        let user_id = cookies
            .get_private(USER_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|user| auth_config.allowed_users.iter().any(|u| u == user));

        let active_filters = cookies
            .get_private(FILTERS_COOKIE)
            .and_then(|c| serde_json::from_str::<FilterSpec>(c.value()).ok())
            .map(|spec| FilterSpec::new(spec.company, spec.keyword, spec.window_days))
            .unwrap_or_default();

        Self {
            authenticated: user_id.is_some(),
            user_id,
            active_filters,
        }
    }

    pub fn login(cookies: &CookieJar<'_>, user_id: &str) {
        let cookie = Cookie::build((USER_COOKIE, user_id.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax);
        cookies.add_private(cookie);
        info!("User {} logged in", user_id);
    }

    pub fn logout(cookies: &CookieJar<'_>) {
        cookies.remove_private(USER_COOKIE);
        cookies.remove_private(FILTERS_COOKIE);
    }

    pub fn save_filters(cookies: &CookieJar<'_>, filters: &FilterSpec) {
        match serde_json::to_string(filters) {
            Ok(value) => {
                let cookie = Cookie::build((FILTERS_COOKIE, value))
                    .http_only(true)
                    .same_site(SameSite::Lax);
                cookies.add_private(cookie);
            }
            Err(e) => warn!("Failed to store filters: {}", e),
        }
    }

    pub fn reset_filters(cookies: &CookieJar<'_>) {
        cookies.remove_private(FILTERS_COOKIE);
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionContext {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => {
                return Outcome::Error((status, AuthError::NotConfigured))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        Outcome::Success(SessionContext::from_cookies(req.cookies(), auth_config))
    }
}

/// Session that must belong to a logged-in user
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session: SessionContext,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.session.active_filters
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let session = match SessionContext::from_request(req).await {
            Outcome::Success(session) => session,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        match session.user_id.clone() {
            Some(user_id) => Outcome::Success(AuthenticatedUser { user_id, session }),
            None => {
                warn!("Rejected request without a session: {}", req.uri());
                Outcome::Error((Status::Unauthorized, AuthError::NotLoggedIn))
            }
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    NotLoggedIn,
    InvalidCredentials,
    NotConfigured,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::NotLoggedIn => "Login required",
            AuthError::InvalidCredentials => "Invalid username or password",
            AuthError::NotConfigured => "Authentication is not configured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            vec!["ruqhaiya".to_string(), "Missy".to_string()],
            "s3cret".to_string(),
        )
    }

    #[test]
    fn test_verify_accepts_listed_user_with_secret() {
        assert_eq!(config().verify("Missy", "s3cret"), Some("Missy".to_string()));
        assert_eq!(config().verify(" ruqhaiya ", "s3cret"), Some("ruqhaiya".to_string()));
    }

    #[test]
    fn test_verify_rejects_everything_else() {
        assert_eq!(config().verify("missy", "s3cret"), None);
        assert_eq!(config().verify("Missy", "wrong"), None);
        assert_eq!(config().verify("mallory", "s3cret"), None);

        let no_secret = AuthConfig::new(vec!["Missy".to_string()], String::new());
        assert_eq!(no_secret.verify("Missy", ""), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::NotLoggedIn.message(), "Login required");
        assert_eq!(
            AuthError::InvalidCredentials.message(),
            "Invalid username or password"
        );
    }
}
