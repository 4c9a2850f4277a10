//! HTTP surface.
//!
//! A thin axum router over the composed services: registration, cookie
//! sign-in, and the `Person` collection. Handlers stay small — they parse,
//! call a capability, and map the result; all policy lives behind the
//! service handles.

use crate::diagnostics::Diagnostics;
use crate::startup::Services;
use axum::extract::{Path, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_data::DataError;
use roster_identity::{IdentityError, UserStore};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the application router.
pub fn router<S>(services: Services<S>) -> Router
where
    S: UserStore + Clone + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register::<S>))
        .route("/auth/login", post(login::<S>))
        .route("/auth/logout", post(logout::<S>))
        .route("/auth/me", get(me::<S>))
        .route("/people", get(people_list::<S>).post(people_create::<S>))
        .route("/people/:id", get(people_find::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

// ═══════════════════════════════════════════════════════════════════════
// Error bridging
// ═══════════════════════════════════════════════════════════════════════

/// HTTP-facing error.
///
/// Wraps domain errors with a status, a stable error code, and an optional
/// diagnostic detail that is only populated when the diagnostics policy
/// allows it.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
    detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            detail: None,
        }
    }

    fn storage(detail: String, diagnostics: Diagnostics) -> Self {
        let mut error = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "A database error occurred",
            "DATABASE_ERROR",
        );
        if diagnostics.database_error_detail() {
            error.detail = Some(detail);
        }
        error
    }

    fn from_identity(err: IdentityError, diagnostics: Diagnostics) -> Self {
        match err {
            IdentityError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "INVALID_CREDENTIALS",
            ),
            IdentityError::SignInNotAllowed => Self::new(
                StatusCode::FORBIDDEN,
                "Sign-in is not allowed for this account",
                "SIGN_IN_NOT_ALLOWED",
            ),
            IdentityError::DuplicateEmail => Self::new(
                StatusCode::CONFLICT,
                "Email is already registered",
                "DUPLICATE_EMAIL",
            ),
            IdentityError::EmailInvalid => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid email address",
                "INVALID_EMAIL",
            ),
            IdentityError::UserNotFound => {
                Self::new(StatusCode::NOT_FOUND, "User not found", "NOT_FOUND")
            }
            IdentityError::TicketInvalid | IdentityError::TicketExpired => Self::new(
                StatusCode::UNAUTHORIZED,
                "Not authenticated",
                "UNAUTHENTICATED",
            ),
            IdentityError::TokenInvalid | IdentityError::TokenExpired => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid token", "INVALID_TOKEN")
            }
            IdentityError::Storage(detail) => Self::storage(detail, diagnostics),
            IdentityError::SchemeNotRegistered { .. }
            | IdentityError::PasswordHash(_)
            | IdentityError::TicketProtection(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
                "INTERNAL",
            ),
        }
    }

    fn from_data(err: &DataError, diagnostics: Diagnostics) -> Self {
        Self::storage(err.to_string(), diagnostics)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                code: self.code,
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Request / response types
// ═══════════════════════════════════════════════════════════════════════

/// Request to register a new user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    /// Email address.
    pub email: String,

    /// Password.
    pub password: String,
}

/// Request to sign in with a password.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,

    /// Password.
    pub password: String,
}

/// A user, as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,

    /// Email address.
    pub email: String,

    /// Whether the email has been confirmed.
    pub email_confirmed: bool,
}

/// The authenticated principal, as recovered from the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalResponse {
    /// User ID.
    pub user_id: Uuid,

    /// Email address at issuance time.
    pub email: String,

    /// Ticket expiry (ISO 8601).
    pub expires_at: String,
}

/// A `Person` row, as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonResponse {
    /// Row identifier.
    pub id: Uuid,
}

// ═══════════════════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════════════════

#[allow(clippy::unused_async)]
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn register<S>(
    State(services): State<Services<S>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError>
where
    S: UserStore + Clone,
{
    let user = services
        .users()
        .create(&request.email, &request.password)
        .await
        .map_err(|e| ApiError::from_identity(e, services.diagnostics()))?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id.0,
            email: user.email,
            email_confirmed: user.email_confirmed,
        }),
    ))
}

async fn login<S>(
    State(services): State<Services<S>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError>
where
    S: UserStore + Clone,
{
    let cookie = services
        .sign_in()
        .password_sign_in(&request.email, &request.password)
        .await
        .map_err(|e| ApiError::from_identity(e, services.diagnostics()))?;
    let ticket = services
        .sign_in()
        .authenticate(&cookie.value)
        .map_err(|e| ApiError::from_identity(e, services.diagnostics()))?;

    Ok((
        AppendHeaders([(SET_COOKIE, cookie.header_value())]),
        Json(PrincipalResponse {
            user_id: ticket.user_id.0,
            email: ticket.email,
            expires_at: ticket.expires_at.to_rfc3339(),
        }),
    )
        .into_response())
}

#[allow(clippy::unused_async)]
async fn logout<S>(State(services): State<Services<S>>) -> Result<Response, ApiError>
where
    S: UserStore + Clone,
{
    let cookie = services
        .sign_in()
        .sign_out()
        .map_err(|e| ApiError::from_identity(e, services.diagnostics()))?;

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, cookie.header_value())]),
    )
        .into_response())
}

#[allow(clippy::unused_async)]
async fn me<S>(
    State(services): State<Services<S>>,
    headers: HeaderMap,
) -> Result<Json<PrincipalResponse>, ApiError>
where
    S: UserStore + Clone,
{
    let sign_in = services.sign_in();
    let scheme = sign_in.schemes().default_scheme();
    let cookie_name = sign_in
        .schemes()
        .handler(scheme)
        .map(roster_identity::CookieAuthenticationHandler::cookie_name)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
                "INTERNAL",
            )
        })?;

    let value = cookie_value(&headers, cookie_name).ok_or_else(|| {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Not authenticated",
            "UNAUTHENTICATED",
        )
    })?;

    let ticket = sign_in
        .authenticate(value)
        .map_err(|e| ApiError::from_identity(e, services.diagnostics()))?;

    Ok(Json(PrincipalResponse {
        user_id: ticket.user_id.0,
        email: ticket.email,
        expires_at: ticket.expires_at.to_rfc3339(),
    }))
}

async fn people_list<S>(
    State(services): State<Services<S>>,
) -> Result<Json<Vec<PersonResponse>>, ApiError>
where
    S: UserStore + Clone,
{
    let people = services
        .people()
        .list()
        .await
        .map_err(|e| ApiError::from_data(&e, services.diagnostics()))?;

    Ok(Json(
        people
            .into_iter()
            .map(|person| PersonResponse { id: person.id })
            .collect(),
    ))
}

async fn people_create<S>(
    State(services): State<Services<S>>,
) -> Result<(StatusCode, Json<PersonResponse>), ApiError>
where
    S: UserStore + Clone,
{
    let person = services
        .people()
        .insert()
        .await
        .map_err(|e| ApiError::from_data(&e, services.diagnostics()))?;

    Ok((StatusCode::CREATED, Json(PersonResponse { id: person.id })))
}

async fn people_find<S>(
    State(services): State<Services<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonResponse>, ApiError>
where
    S: UserStore + Clone,
{
    let person = services
        .people()
        .find(id)
        .await
        .map_err(|e| ApiError::from_data(&e, services.diagnostics()))?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Person not found", "NOT_FOUND"))?;

    Ok(Json(PersonResponse { id: person.id }))
}

/// Extract a cookie value from the `Cookie` request header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let header = headers.get(COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;

    #[test]
    fn cookie_values_are_extracted_by_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "other=1; .roster.application=abc.def; trailing=2".parse().unwrap(),
        );

        assert_eq!(
            cookie_value(&headers, ".roster.application"),
            Some("abc.def")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn storage_detail_is_gated_by_diagnostics() {
        let verbose = ApiError::storage("relation missing".into(), Diagnostics::enabled());
        let quiet = ApiError::storage("relation missing".into(), Diagnostics::disabled());

        assert_eq!(verbose.detail.as_deref(), Some("relation missing"));
        assert_eq!(quiet.detail, None);
    }
}
