mod helpers;

use chrono::NaiveDate;
use condomi_core::models::PlanTier;
use condomi_infra::webhook::{sign_payload, SIGNATURE_HEADER};
use helpers::{api_path, setup_test_app, TestApp, WEBHOOK_SECRET};
use rust_decimal::Decimal;
use uuid::Uuid;

async fn pending_invoice(app: &TestApp) -> Uuid {
    let (_, sub) = app.onboard(PlanTier::Start).await;
    app.seed_invoice(
        &sub,
        Decimal::new(9990, 2),
        NaiveDate::from_ymd_opt(2024, 6, 25).unwrap(),
        None,
    )
    .await
    .id
}

async fn deliver(app: &TestApp, body: &str, signature: &str) -> axum_test::TestResponse {
    app.client()
        .post(&api_path("/webhooks/payment"))
        .add_header(SIGNATURE_HEADER, signature.to_string())
        .text(body.to_string())
        .await
}

#[tokio::test]
async fn test_signed_confirmation_marks_paid_once() {
    let app = setup_test_app().await;
    let invoice_id = pending_invoice(&app).await;
    let body = serde_json::json!({
        "invoice_id": invoice_id,
        "transaction_id": "txn_001",
        "status": "paid"
    })
    .to_string();
    let signature = sign_payload(WEBHOOK_SECRET, body.as_bytes()).unwrap();

    let response = deliver(&app, &body, &signature).await;
    assert_eq!(response.status_code(), 200);
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["status"], "paid");

    let response = deliver(&app, &body, &signature).await;
    assert_eq!(response.status_code(), 200);
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["status"], "already_paid");

    let admin = app.superadmin();
    let view: serde_json::Value = app
        .client()
        .get(&api_path(&format!("/invoices/{}", invoice_id)))
        .add_header("Authorization", app.bearer(admin))
        .await
        .json();
    assert_eq!(view["status"], "paid");
    assert_eq!(view["payment_method"], "pix");
    assert_eq!(view["payment_reference"], "txn_001");
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let app = setup_test_app().await;
    let invoice_id = pending_invoice(&app).await;
    let body = serde_json::json!({ "invoice_id": invoice_id, "transaction_id": "txn_002" })
        .to_string();
    let forged = sign_payload("not-the-shared-secret", body.as_bytes()).unwrap();

    let response = deliver(&app, &body, &forged).await;
    assert_eq!(response.status_code(), 401);

    let response = deliver(&app, &body, "").await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_non_settlement_event_ignored() {
    let app = setup_test_app().await;
    let invoice_id = pending_invoice(&app).await;
    let body = serde_json::json!({
        "invoice_id": invoice_id,
        "transaction_id": "txn_003",
        "status": "waiting_payment"
    })
    .to_string();
    let signature = sign_payload(WEBHOOK_SECRET, body.as_bytes()).unwrap();

    let response = deliver(&app, &body, &signature).await;
    assert_eq!(response.status_code(), 202);
}

#[tokio::test]
async fn test_unknown_invoice_not_found() {
    let app = setup_test_app().await;
    let body = serde_json::json!({ "invoice_id": Uuid::new_v4(), "transaction_id": "txn_004" })
        .to_string();
    let signature = sign_payload(WEBHOOK_SECRET, body.as_bytes()).unwrap();

    let response = deliver(&app, &body, &signature).await;
    assert_eq!(response.status_code(), 404);
}
