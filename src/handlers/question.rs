use crate::{
    error::{AppError, AppResult},
    middleware::auth::{parse_user_id, AuthUser},
    models::QuestionModel,
    response::{ApiResponse, Pagination},
    services::question::{
        CreateQuestionRequest, QuestionListQuery, QuestionService, QuestionStats,
        UpdateQuestionRequest,
    },
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionListData {
    pub questions: Vec<QuestionModel>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRevisionRequest {
    /// Explicit target value; omitted means flip the current flag.
    pub needs_revision: Option<bool>,
}

fn check(input: &impl Validate) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Record a solved question.
#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question recorded", body = ApiResponse<QuestionModel>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn create_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateQuestionRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;
    let user_id = parse_user_id(&auth_user)?;

    let question = QuestionService::new(db).create(user_id, payload).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(question)))
}

/// List own questions with filtering, sorting, and pagination.
#[utoipa::path(
    get,
    path = "/api/questions",
    params(
        ("page" = Option<u64>, Query, description = "1-indexed page, default 1"),
        ("limit" = Option<u64>, Query, description = "Page size 1-100, default 20"),
        ("topic" = Option<String>, Query, description = "Keep questions whose topics contain this value"),
        ("platform" = Option<String>, Query, description = "Exact platform match"),
        ("difficulty" = Option<String>, Query, description = "Easy, Medium, or Hard"),
        ("needsRevision" = Option<bool>, Query, description = "Filter by the revision flag"),
        ("search" = Option<String>, Query, description = "Case-insensitive substring over title, description, notes"),
        ("sortBy" = Option<String>, Query, description = "solvedDate (default), title, difficulty, or topic"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc (default)"),
    ),
    responses(
        (status = 200, description = "One page of questions", body = ApiResponse<QuestionListData>),
        (status = 400, description = "Unknown filter or sort value", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn list_questions(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<QuestionListQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let (questions, total, page, limit) = QuestionService::new(db).list(user_id, &query).await?;
    let pagination = Pagination::new(total, page, limit, questions.len() as u64);

    Ok(ApiResponse::ok(QuestionListData {
        questions,
        pagination,
    }))
}

/// Aggregate counts over own questions.
#[utoipa::path(
    get,
    path = "/api/questions/stats",
    responses(
        (status = 200, description = "Aggregated counts", body = ApiResponse<QuestionStats>),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn question_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let stats = QuestionService::new(db).stats(user_id).await?;
    Ok(ApiResponse::ok(stats))
}

/// Fetch one of your own questions.
#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    params(("id" = i32, Path, description = "Question id")),
    responses(
        (status = 200, description = "The question", body = ApiResponse<QuestionModel>),
        (status = 404, description = "Not found or owned by someone else", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn get_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let question = QuestionService::new(db).get_owned(user_id, id).await?;
    Ok(ApiResponse::ok(question))
}

/// Partially update one of your own questions.
#[utoipa::path(
    put,
    path = "/api/questions/{id}",
    params(("id" = i32, Path, description = "Question id")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Updated question", body = ApiResponse<QuestionModel>),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Not found or owned by someone else", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn update_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> AppResult<impl IntoResponse> {
    check(&payload)?;
    let user_id = parse_user_id(&auth_user)?;

    let question = QuestionService::new(db).update(user_id, id, payload).await?;
    Ok(ApiResponse::with_message(
        question,
        "Question updated successfully".to_string(),
    ))
}

/// Delete one of your own questions.
#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(("id" = i32, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not found or owned by someone else", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn delete_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    QuestionService::new(db).delete(user_id, id).await?;
    Ok(ApiResponse::<serde_json::Value>::with_message(
        serde_json::json!({}),
        "Question deleted successfully".to_string(),
    ))
}

/// Flip (or explicitly set) the revision flag on a question.
#[utoipa::path(
    patch,
    path = "/api/questions/{id}/toggle-revision",
    params(("id" = i32, Path, description = "Question id")),
    request_body = ToggleRevisionRequest,
    responses(
        (status = 200, description = "Updated question", body = ApiResponse<QuestionModel>),
        (status = 404, description = "Not found or owned by someone else", body = AppError),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn toggle_revision(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    payload: Result<Json<ToggleRevisionRequest>, axum::extract::rejection::JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let service = QuestionService::new(db);

    // Absent or empty body means flip
    let current = service.get_owned(user_id, id).await?;
    let target = payload
        .ok()
        .and_then(|Json(p)| p.needs_revision)
        .unwrap_or(!current.needs_revision);

    let question = service.set_revision(user_id, id, target).await?;
    Ok(ApiResponse::ok(question))
}
