use crate::{
    error::{AppError, AppResult},
    middleware::auth::{parse_user_id, AuthUser},
    models::UserModel,
    response::ApiResponse,
    services::{auth::AuthService, email::EmailService},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub email: String,
    pub requires_verification: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthData {
    pub token: String,
    pub user: UserModel,
}

fn check(input: &impl Validate) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Register a new account and email its verification code.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, OTP sent", body = ApiResponse<RegistrationData>),
        (status = 200, description = "Unverified account refreshed, OTP resent", body = ApiResponse<RegistrationData>),
        (status = 400, description = "Validation error or already-verified email", body = AppError),
        (status = 500, description = "OTP email could not be sent", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;

    let outcome = AuthService::new(db)
        .register(&payload.name, &payload.email, &payload.password, &email_service)
        .await?;

    let (status, message) = if outcome.created {
        (
            StatusCode::CREATED,
            "Registration successful! Please check your email for the verification OTP.",
        )
    } else {
        (
            StatusCode::OK,
            "A new verification OTP has been sent to your email.",
        )
    };

    let data = RegistrationData {
        email: outcome.email,
        requires_verification: true,
    };
    Ok((status, ApiResponse::with_message(data, message.to_string())))
}

/// Verify an emailed OTP and log the account in.
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified, session issued", body = ApiResponse<AuthData>),
        (status = 400, description = "Wrong, expired, or already-consumed OTP", body = AppError),
        (status = 404, description = "No account for this email", body = AppError),
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;

    let (user, token) = AuthService::new(db)
        .verify_otp(&payload.email, &payload.otp, &email_service)
        .await?;

    Ok(ApiResponse::with_message(
        AuthData { token, user },
        "Email verified successfully".to_string(),
    ))
}

/// Reissue the verification OTP for an unverified account.
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "Fresh OTP sent", body = ApiResponse<RegistrationData>),
        (status = 400, description = "Account already verified", body = AppError),
        (status = 404, description = "No account for this email", body = AppError),
        (status = 500, description = "OTP email could not be sent", body = AppError),
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ResendOtpRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;

    AuthService::new(db)
        .resend_otp(&payload.email, &email_service)
        .await?;

    let data = RegistrationData {
        email: crate::services::auth::normalize_email(&payload.email),
        requires_verification: true,
    };
    Ok(ApiResponse::with_message(
        data,
        "A new OTP has been sent to your email.".to_string(),
    ))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = ApiResponse<AuthData>),
        (status = 400, description = "Invalid credentials", body = AppError),
        (status = 403, description = "Email not verified; OTP resent", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;

    let (user, token) = AuthService::new(db)
        .login(&payload.email, &payload.password, &email_service)
        .await?;

    Ok(ApiResponse::with_message(
        AuthData { token, user },
        "Login successful".to_string(),
    ))
}

/// Current authenticated account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<UserModel>),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let user = AuthService::new(db).get_user_by_id(user_id).await?;
    Ok(ApiResponse::ok(user))
}

/// Change the account password after re-checking the current one.
#[utoipa::path(
    put,
    path = "/api/user/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Wrong current password or weak new one", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;
    let user_id = parse_user_id(&auth_user)?;

    AuthService::new(db)
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::<serde_json::Value>::with_message(
        serde_json::json!({}),
        "Password changed successfully".to_string(),
    ))
}

/// Permanently delete the account and all of its questions.
#[utoipa::path(
    delete,
    path = "/api/user/account",
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Wrong password", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn delete_account(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    AuthService::new(db)
        .delete_account(user_id, &payload.password)
        .await?;

    Ok(ApiResponse::<serde_json::Value>::with_message(
        serde_json::json!({}),
        "Account deleted successfully".to_string(),
    ))
}
