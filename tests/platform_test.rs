mod common;

use serde_json::Value;

async fn spawn_with_mocks() -> Option<common::TestApp> {
    common::use_mock_platforms();
    common::spawn_app().await
}

#[tokio::test]
async fn leetcode_lookup_returns_difficulty_breakdown() {
    let Some(app) = spawn_with_mocks().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app
        .client
        .get(app.url("/leetcode/somebody"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["Easy"], 80);
    assert_eq!(body["data"]["Medium"], 50);
    assert_eq!(body["data"]["Hard"], 20);
}

#[tokio::test]
async fn leetcode_lookup_unknown_user_is_404() {
    let Some(app) = spawn_with_mocks().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app
        .client
        .get(app.url("/leetcode/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn codeforces_lookup_returns_profile_card() {
    let Some(app) = spawn_with_mocks().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app
        .client
        .get(app.url("/codeforce/tourist_jr"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["handle"], "tourist_jr");
    assert_eq!(data["rating"], 1543);
    assert_eq!(data["maxRank"], "expert");
    // Registration time is reported in epoch milliseconds
    assert_eq!(data["registeredAt"], 1_600_000_000_000i64);
}

#[tokio::test]
async fn codeforces_lookup_unknown_handle_is_404() {
    let Some(app) = spawn_with_mocks().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app
        .client
        .get(app.url("/codeforce/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
