mod helpers;

use chrono::Duration;
use condomi_core::models::{PlanTier, Role};
use helpers::{api_path, setup_test_app};

#[tokio::test]
async fn test_start_plan_notification_quota() {
    let app = setup_test_app().await;
    let (condo, _) = app.onboard(PlanTier::Start).await;
    let sindico = app.user_with_role(Role::Sindico, Some(condo.id));
    let path = api_path(&format!("/condominiums/{}/usage/notifications", condo.id));

    for _ in 0..10 {
        let response = app
            .client()
            .post(&path)
            .add_header("Authorization", app.bearer(sindico))
            .json(&serde_json::json!({}))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", app.bearer(sindico))
        .json(&serde_json::json!({ "amount": 1 }))
        .await;
    assert_eq!(response.status_code(), 402);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "QUOTA_EXCEEDED");
    assert_eq!(data["recoverable"], false);

    let response = app
        .client()
        .get(&api_path(&format!("/condominiums/{}/usage", condo.id)))
        .add_header("Authorization", app.bearer(sindico))
        .await;
    assert_eq!(response.status_code(), 200);
    let summary: serde_json::Value = response.json();
    let notifications = summary["counters"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["kind"] == "notification")
        .unwrap()
        .clone();
    assert_eq!(notifications["used"], 10);
    assert_eq!(notifications["remaining"], 0);
}

#[tokio::test]
async fn test_porteiro_limited_to_package_notifications() {
    let app = setup_test_app().await;
    let (condo, _) = app.onboard(PlanTier::Start).await;
    let porteiro = app.user_with_role(Role::Porteiro, Some(condo.id));

    let response = app
        .client()
        .post(&api_path(&format!(
            "/condominiums/{}/usage/package_notifications",
            condo.id
        )))
        .add_header("Authorization", app.bearer(porteiro))
        .json(&serde_json::json!({ "amount": 3 }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .post(&api_path(&format!("/condominiums/{}/usage/warnings", condo.id)))
        .add_header("Authorization", app.bearer(porteiro))
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_other_tenant_forbidden() {
    let app = setup_test_app().await;
    let (condo, _) = app.onboard(PlanTier::Start).await;
    let (other, _) = app.onboard(PlanTier::Start).await;
    let sindico = app.user_with_role(Role::Sindico, Some(other.id));

    let response = app
        .client()
        .get(&api_path(&format!("/condominiums/{}/usage", condo.id)))
        .add_header("Authorization", app.bearer(sindico))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_unknown_kind_and_bad_amount() {
    let app = setup_test_app().await;
    let (condo, _) = app.onboard(PlanTier::Start).await;
    let sindico = app.user_with_role(Role::Sindico, Some(condo.id));

    let response = app
        .client()
        .post(&api_path(&format!("/condominiums/{}/usage/emails", condo.id)))
        .add_header("Authorization", app.bearer(sindico))
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .client()
        .post(&api_path(&format!("/condominiums/{}/usage/fines", condo.id)))
        .add_header("Authorization", app.bearer(sindico))
        .json(&serde_json::json!({ "amount": 0 }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_expired_period_until_rollover() {
    let app = setup_test_app().await;
    let (condo, _) = app.onboard(PlanTier::Start).await;
    let sindico = app.user_with_role(Role::Sindico, Some(condo.id));
    let admin = app.superadmin();
    let consume = api_path(&format!("/condominiums/{}/usage/fines", condo.id));

    app.clock.advance(Duration::days(40));

    let response = app
        .client()
        .post(&consume)
        .add_header("Authorization", app.bearer(sindico))
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 409);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "PERIOD_EXPIRED");

    let response = app
        .client()
        .post(&api_path(&format!("/condominiums/{}/rollover", condo.id)))
        .add_header("Authorization", app.bearer(admin))
        .await;
    assert_eq!(response.status_code(), 200);
    let outcome: serde_json::Value = response.json();
    assert_eq!(outcome["rolled_over"], true);
    assert_eq!(outcome["invoice"]["status"], "pending");

    let response = app
        .client()
        .post(&consume)
        .add_header("Authorization", app.bearer(sindico))
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 200);
}
