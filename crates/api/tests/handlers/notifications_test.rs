use std::sync::Arc;

use axum::http::StatusCode;
use mockall::predicate::function;
use officehours_core::notify::{Notification, TEMPLATE_APPOINTMENT_BOOKED, TEMPLATE_APPOINTMENT_CANCELLED};
use officehours_db::mock::MockMailer;
use serde_json::{json, Value};

use crate::common::{bearer, bearer_name, TestApp};

async fn book(app: &TestApp) -> (String, i64) {
    let (p1_id, p1) = app.signed_in("ProfessorP1", true).await;
    let (_, a1) = app.signed_in("StudentA1", false).await;
    let slot_id = app.publish_slot(&p1, 2).await;

    let response = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&json!({
            "professor_id": p1_id,
            "slot_id": slot_id,
            "reason": "Need help with course topics",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let appointment_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();
    (p1, appointment_id)
}

#[tokio::test]
async fn test_booking_notifies_both_parties() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .with(function(|n: &Notification| {
            n.template == TEMPLATE_APPOINTMENT_BOOKED
                && (n.to == "studenta1@test.com" || n.to == "professorp1@test.com")
        }))
        .times(2)
        .returning(|_| Ok(()));

    let app = TestApp::with_mailer(Arc::new(mailer));
    book(&app).await;

    app.finish().await;
}

#[tokio::test]
async fn test_professor_cancellation_notifies_student() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .withf(|n: &Notification| n.template == TEMPLATE_APPOINTMENT_BOOKED)
        .times(2)
        .returning(|_| Ok(()));
    mailer
        .expect_send()
        .withf(|n: &Notification| {
            n.template == TEMPLATE_APPOINTMENT_CANCELLED && n.to == "studenta1@test.com"
        })
        .times(1)
        .returning(|_| Ok(()));

    let app = TestApp::with_mailer(Arc::new(mailer));
    let (p1, appointment_id) = book(&app).await;

    app.server
        .post(&format!("/api/appointments/{}/cancel", appointment_id))
        .add_header(bearer_name(), bearer(&p1))
        .await
        .assert_status_ok();

    app.finish().await;
}

#[tokio::test]
async fn test_mail_failure_does_not_undo_booking() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .returning(|_| Err(eyre::eyre!("smtp relay refused connection")));

    let app = TestApp::with_mailer(Arc::new(mailer));
    let (p1, _) = book(&app).await;

    let listing = app
        .server
        .get("/api/professor/appointments")
        .add_header(bearer_name(), bearer(&p1))
        .await;
    assert_eq!(listing.json::<Value>()["count"], json!(1));

    app.finish().await;
}
