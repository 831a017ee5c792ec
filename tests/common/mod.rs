#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once, OnceLock,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static TABLES_CLEANED: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Per-IP throttling would trip across parallel tests
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = dsatrack::config::jwt::JwtConfig::from_env().unwrap();
        let _ = dsatrack::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

/// Spin up the full app on a random port. Returns None (and the test should
/// bail out early) when no database is configured, so the suite still runs
/// in environments without Postgres.
pub async fn spawn_app() -> Option<TestApp> {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        dsatrack::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // One wipe per test binary; tests isolate themselves per account after
    // that, so parallel tests cannot truncate each other's rows away.
    if !TABLES_CLEANED.swap(true, Ordering::SeqCst) {
        cleanup_tables(&db).await;
    }

    let email_service = dsatrack::services::email::EmailService::from_env();
    let platform_service = dsatrack::services::platform::PlatformService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(dsatrack::routes::create_routes())
        .layer(axum::middleware::from_fn(
            dsatrack::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(email_service))
        .layer(axum::extract::Extension(platform_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    })
}

async fn cleanup_tables(db: &DatabaseConnection) {
    for table in ["questions", "users"] {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

pub fn unique_email(prefix: &str) -> String {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}_{}@test.com", prefix, std::process::id(), counter)
}

/// Read the pending verification code straight from the store. SMTP is not
/// configured in tests, so this is the only way to observe the OTP.
pub async fn fetch_otp(db: &DatabaseConnection, email: &str) -> String {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT verification_otp FROM users WHERE email = $1",
            vec![email.into()],
        ))
        .await
        .expect("Failed to query OTP")
        .expect("No user row for email");

    let otp: Option<String> = row.try_get_by_index(0).expect("Failed to read OTP column");
    otp.expect("User has no pending OTP")
}

/// Register and verify an account, returning (email, token).
pub async fn create_verified_user(app: &TestApp, prefix: &str) -> (String, String) {
    let email = unique_email(prefix);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");
    assert_eq!(resp.status(), 201, "registration should create the account");

    let otp = fetch_otp(&app.db, &email).await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": otp }))
        .send()
        .await
        .expect("Failed to verify OTP");
    let body: serde_json::Value = resp.json().await.expect("Failed to parse verify response");
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Verify response missing token: {body}"))
        .to_string();

    (email, token)
}

/// Record a question for the given account and return its id.
pub async fn create_question(
    app: &TestApp,
    token: &str,
    payload: serde_json::Value,
) -> serde_json::Value {
    let resp = app
        .client
        .post(app.url("/questions"))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to create question");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse question body");
    assert_eq!(status, 201, "question create failed: {body}");
    body["data"].clone()
}

static MOCK_PLATFORM_ADDR: OnceLock<String> = OnceLock::new();

/// Stand-in for the LeetCode, Codeforces, and GitHub APIs. Runs on its own
/// thread with its own runtime so it outlives any single test's runtime.
/// Every lookup for the user "ghost" fails the way the real APIs do.
pub fn mock_platform_server() -> &'static str {
    MOCK_PLATFORM_ADDR.get_or_init(|| {
        let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build mock server runtime");

            rt.block_on(async move {
                let app = mock_platform_routes();
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind mock server port");
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        let addr = rx.recv().expect("Mock server failed to start");
        format!("http://{}", addr)
    })
}

fn mock_platform_routes() -> axum::Router {
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::Json;
    use std::collections::HashMap;

    axum::Router::new()
        .route(
            "/lc/{username}",
            axum::routing::get(|Path(username): Path<String>| async move {
                if username == "ghost" {
                    Json(serde_json::json!({
                        "status": "error",
                        "message": "user does not exist"
                    }))
                } else {
                    Json(serde_json::json!({
                        "status": "success",
                        "totalSolved": 150,
                        "totalQuestions": 3000,
                        "easySolved": 80,
                        "mediumSolved": 50,
                        "hardSolved": 20,
                        "acceptanceRate": 61.2,
                        "ranking": 52000
                    }))
                }
            }),
        )
        .route(
            "/cf/user.info",
            axum::routing::get(
                |Query(params): Query<HashMap<String, String>>| async move {
                    let handle = params.get("handles").cloned().unwrap_or_default();
                    if handle == "ghost" {
                        Json(serde_json::json!({
                            "status": "FAILED",
                            "comment": "handles: User with handle ghost not found"
                        }))
                    } else {
                        Json(serde_json::json!({
                            "status": "OK",
                            "result": [{
                                "handle": handle,
                                "rating": 1543,
                                "maxRating": 1622,
                                "rank": "specialist",
                                "maxRank": "expert",
                                "contribution": 4,
                                "friendOfCount": 12,
                                "titlePhoto": "https://example.com/photo.png",
                                "registrationTimeSeconds": 1600000000i64
                            }]
                        }))
                    }
                },
            ),
        )
        .route(
            "/gh/users/{username}",
            axum::routing::get(|Path(username): Path<String>| async move {
                if username == "ghost" {
                    Err(StatusCode::NOT_FOUND)
                } else {
                    Ok(Json(serde_json::json!({
                        "login": username,
                        "name": "Octo Cat",
                        "public_repos": 8,
                        "followers": 42,
                        "following": 7,
                        "avatar_url": "https://example.com/avatar.png"
                    })))
                }
            }),
        )
        .route(
            "/gh/users/{username}/repos",
            axum::routing::get(|Path(username): Path<String>| async move {
                if username == "ghost" {
                    Err(StatusCode::NOT_FOUND)
                } else {
                    Ok(Json(serde_json::json!([
                        { "stargazers_count": 10, "forks_count": 2 },
                        { "stargazers_count": 3, "forks_count": 0 }
                    ])))
                }
            }),
        )
}

/// Point all upstream platform calls at the local mock. Must run before the
/// first spawn_app() in the binary.
pub fn use_mock_platforms() {
    let base = mock_platform_server();
    std::env::set_var("LEETCODE_API_BASE", format!("{base}/lc"));
    std::env::set_var("CODEFORCES_API_BASE", format!("{base}/cf"));
    std::env::set_var("GITHUB_API_BASE", format!("{base}/gh"));
}
