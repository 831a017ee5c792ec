use crate::{
    error::{AppError, AppResult},
    middleware::auth::{parse_user_id, AuthUser},
    models::UserModel,
    response::ApiResponse,
    services::{
        platform::PlatformService,
        user::{PlatformUsernamesRequest, UpdateProfileRequest, UserService},
    },
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sea_orm::DatabaseConnection;
use validator::Validate;

/// Full profile, including linked platform handles.
#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<UserModel>),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let user = UserService::new(db).get_by_id(user_id).await?;
    Ok(ApiResponse::ok(user))
}

/// Update profile name and preferences.
#[utoipa::path(
    put,
    path = "/api/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserModel>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let user_id = parse_user_id(&auth_user)?;

    let user = UserService::new(db).update_profile(user_id, payload).await?;
    Ok(ApiResponse::with_message(
        user,
        "Profile updated successfully".to_string(),
    ))
}

/// Link coding-platform handles for the first time. Every handle is
/// verified upstream before anything is stored.
#[utoipa::path(
    post,
    path = "/api/user/platform-usernames",
    request_body = PlatformUsernamesRequest,
    responses(
        (status = 201, description = "Handles stored", body = ApiResponse<UserModel>),
        (status = 400, description = "Missing, invalid, or already-submitted handles", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
        (status = 502, description = "A platform API was unreachable", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn submit_platform_usernames(
    Extension(db): Extension<DatabaseConnection>,
    Extension(platform_service): Extension<PlatformService>,
    auth_user: AuthUser,
    Json(payload): Json<PlatformUsernamesRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let user = UserService::new(db)
        .submit_platform_usernames(user_id, payload, &platform_service)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(user, "Platform usernames saved successfully".to_string()),
    ))
}

/// Merge-update stored platform handles. Handles are not re-verified.
#[utoipa::path(
    put,
    path = "/api/user/platform-usernames",
    request_body = PlatformUsernamesRequest,
    responses(
        (status = 200, description = "Handles updated", body = ApiResponse<UserModel>),
        (status = 400, description = "No handle provided", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn update_platform_usernames(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<PlatformUsernamesRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let user = UserService::new(db)
        .update_platform_usernames(user_id, payload)
        .await?;

    Ok(ApiResponse::with_message(
        user,
        "Platform usernames updated successfully".to_string(),
    ))
}

/// Aggregated stats for every linked platform. Platforms fail
/// independently; a down upstream shows as an error entry.
#[utoipa::path(
    get,
    path = "/api/user/platform-stats",
    responses(
        (status = 200, description = "Per-platform stats or error entries", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "No handles linked yet", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn platform_stats(
    Extension(db): Extension<DatabaseConnection>,
    Extension(platform_service): Extension<PlatformService>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let stats = UserService::new(db)
        .platform_stats(user_id, &platform_service)
        .await?;
    Ok(ApiResponse::ok(stats))
}
