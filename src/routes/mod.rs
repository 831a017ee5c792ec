use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public = public_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public).merge(protected)
}

/// Credential and verification endpoints, rate limited hardest.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::auth::register))
        .route("/auth/verify-otp", routing::post(handlers::auth::verify_otp))
        .route("/auth/resend-otp", routing::post(handlers::auth::resend_otp))
        .route("/auth/login", routing::post(handlers::auth::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public platform lookups, no token required.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/leetcode/{username}",
            routing::get(handlers::platform::leetcode_lookup),
        )
        .route(
            "/codeforce/{username}",
            routing::get(handlers::platform::codeforces_lookup),
        );

    with_optional_rate_limit(router, config.enabled, config.public)
}

/// Everything behind the bearer token.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Session
        .route("/auth/me", routing::get(handlers::auth::me))
        // Questions (stats before {id} so it is not captured as an id)
        .route("/questions/stats", routing::get(handlers::question::question_stats))
        .route(
            "/questions",
            routing::post(handlers::question::create_question)
                .get(handlers::question::list_questions),
        )
        .route(
            "/questions/{id}",
            routing::get(handlers::question::get_question)
                .put(handlers::question::update_question)
                .delete(handlers::question::delete_question),
        )
        .route(
            "/questions/{id}/toggle-revision",
            routing::patch(handlers::question::toggle_revision),
        )
        // Account
        .route(
            "/user/profile",
            routing::get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route(
            "/user/platform-usernames",
            routing::post(handlers::user::submit_platform_usernames)
                .put(handlers::user::update_platform_usernames),
        )
        .route(
            "/user/platform-stats",
            routing::get(handlers::user::platform_stats),
        )
        .route("/user/password", routing::put(handlers::auth::change_password))
        .route("/user/account", routing::delete(handlers::auth::delete_account));

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
