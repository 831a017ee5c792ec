use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credentials matched but the account is unverified. A fresh OTP has
    /// already been dispatched by the time this is returned.
    #[error("Email verification required")]
    VerificationRequired { email: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid OTP")]
    InvalidCode,

    #[error("OTP expired")]
    ExpiredCode,

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, json!({ "error": "Invalid token" }))
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Resource not found" }),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            // Same body for unknown email and wrong password.
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid credentials" }),
            ),
            AppError::VerificationRequired { email } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Please verify your email first. OTP sent to your email.",
                    "requiresVerification": true,
                    "email": email,
                }),
            ),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InvalidCode => (StatusCode::BAD_REQUEST, json!({ "error": "Invalid OTP" })),
            AppError::ExpiredCode => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "OTP has expired. Please request a new one." }),
            ),
            AppError::Notification(msg) => {
                tracing::error!("Email delivery failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to send verification email. Please try again." }),
                )
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream fetch failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Upstream platform unavailable" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
