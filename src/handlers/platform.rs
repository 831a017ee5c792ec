use crate::{
    error::{AppError, AppResult},
    response::ApiResponse,
    services::platform::{CodeforcesProfile, LeetCodeSolvedBreakdown, PlatformService},
};
use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
};

/// Public LeetCode lookup: solved counts per difficulty.
#[utoipa::path(
    get,
    path = "/api/leetcode/{username}",
    params(("username" = String, Path, description = "LeetCode username")),
    responses(
        (status = 200, description = "Solved counts by difficulty", body = ApiResponse<LeetCodeSolvedBreakdown>),
        (status = 404, description = "No such LeetCode user", body = AppError),
        (status = 502, description = "LeetCode API unreachable", body = AppError),
    ),
    tag = "platforms"
)]
pub async fn leetcode_lookup(
    Extension(platform_service): Extension<PlatformService>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let breakdown = platform_service.leetcode_solved(&username).await?;
    Ok(ApiResponse::ok(breakdown))
}

/// Public Codeforces lookup: profile card with rating and rank.
#[utoipa::path(
    get,
    path = "/api/codeforce/{username}",
    params(("username" = String, Path, description = "Codeforces handle")),
    responses(
        (status = 200, description = "Profile card", body = ApiResponse<CodeforcesProfile>),
        (status = 404, description = "No such Codeforces user", body = AppError),
        (status = 502, description = "Codeforces API unreachable", body = AppError),
    ),
    tag = "platforms"
)]
pub async fn codeforces_lookup(
    Extension(platform_service): Extension<PlatformService>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let profile = platform_service.codeforces_profile(&username).await?;
    Ok(ApiResponse::ok(profile))
}
