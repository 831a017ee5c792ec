mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::auth::register,
        crate::handlers::auth::verify_otp,
        crate::handlers::auth::resend_otp,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::change_password,
        crate::handlers::auth::delete_account,
        // Question routes
        crate::handlers::question::create_question,
        crate::handlers::question::list_questions,
        crate::handlers::question::question_stats,
        crate::handlers::question::get_question,
        crate::handlers::question::update_question,
        crate::handlers::question::delete_question,
        crate::handlers::question::toggle_revision,
        // User routes
        crate::handlers::user::get_profile,
        crate::handlers::user::update_profile,
        crate::handlers::user::submit_platform_usernames,
        crate::handlers::user::update_platform_usernames,
        crate::handlers::user::platform_stats,
        // Public platform lookups
        crate::handlers::platform::leetcode_lookup,
        crate::handlers::platform::codeforces_lookup,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::Pagination,
            crate::error::AppError,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::VerifyOtpRequest,
            crate::handlers::auth::ResendOtpRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::ChangePasswordRequest,
            crate::handlers::auth::DeleteAccountRequest,
            crate::handlers::auth::RegistrationData,
            crate::handlers::auth::AuthData,
            // Questions
            crate::services::question::CreateQuestionRequest,
            crate::services::question::UpdateQuestionRequest,
            crate::services::question::QuestionListQuery,
            crate::services::question::QuestionStats,
            crate::services::question::StatBucket,
            crate::handlers::question::QuestionListData,
            crate::handlers::question::ToggleRevisionRequest,
            // User
            crate::services::user::UpdateProfileRequest,
            crate::services::user::PreferencesPatch,
            crate::services::user::PlatformUsernamesRequest,
            crate::models::user::PlatformUsernames,
            crate::models::user::Preferences,
            // Platforms
            crate::services::platform::LeetCodeStats,
            crate::services::platform::LeetCodeSolvedBreakdown,
            crate::services::platform::CodeforcesProfile,
            crate::services::platform::GitHubStats,
        )
    ),
    tags(
        (name = "auth", description = "Registration, verification, and sessions"),
        (name = "questions", description = "Solved-question tracking"),
        (name = "user", description = "Profile and platform handle management"),
        (name = "platforms", description = "Public coding-platform lookups"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsatrack=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting DSA Tracker API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let email_service = services::email::EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    let platform_service = services::platform::PlatformService::from_env();

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(email_service))
        .layer(Extension(platform_service));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "DSA Tracker API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
