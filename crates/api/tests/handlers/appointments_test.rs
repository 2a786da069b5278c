//! The booking flow over HTTP:
//! P1 publishes two slots, A1 and A2 each book one, P1 cancels A1's
//! appointment and A1 is left with nothing booked.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use officehours_core::ledger::SlotLedger;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};

use crate::common::{bearer, bearer_name, TestApp};

fn booking(professor_id: i64, slot_id: i64) -> Value {
    json!({
        "professor_id": professor_id,
        "slot_id": slot_id,
        "reason": "Need help with course topics",
    })
}

#[tokio::test]
async fn test_booking_flow() {
    let app = TestApp::new();
    let (p1_id, p1) = app.signed_in("ProfessorP1", true).await;
    let (a1_id, a1) = app.signed_in("StudentA1", false).await;
    let (_, a2) = app.signed_in("StudentA2", false).await;
    let t1 = app.publish_slot(&p1, 2).await;
    let t2 = app.publish_slot(&p1, 4).await;

    let booked = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&booking(p1_id, t1))
        .await;
    booked.assert_status(StatusCode::CREATED);
    let body = booked.json::<Value>();
    assert_eq!(body["message"], json!("Appointment is successfully created"));
    assert_eq!(body["data"]["status"], json!("booked"));
    assert_eq!(body["data"]["student_id"], json!(a1_id));

    let again = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&booking(p1_id, t1))
        .await;
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(again.json::<Value>()["message"], json!("slot is already booked"));

    app.server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a2))
        .json(&booking(p1_id, t2))
        .await
        .assert_status(StatusCode::CREATED);

    let professor_view = app
        .server
        .get("/api/professor/appointments")
        .add_header(bearer_name(), bearer(&p1))
        .await;
    professor_view.assert_status_ok();
    let professor_view = professor_view.json::<Value>();
    assert_eq!(professor_view["count"], json!(2));
    let a1_appointment = professor_view["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["student"]["id"] == json!(a1_id))
        .expect("A1's appointment is listed for P1")["id"]
        .as_i64()
        .unwrap();

    let cancelled = app
        .server
        .post(&format!("/api/appointments/{}/cancel", a1_appointment))
        .add_header(bearer_name(), bearer(&p1))
        .await;
    cancelled.assert_status_ok();
    assert_eq!(cancelled.json::<Value>()["data"]["status"], json!("cancelled"));
    assert!(!app.store.find_slot(p1_id, t1).await.unwrap().unwrap().is_booked);

    let a1_booked = app
        .server
        .get("/api/student/appointments")
        .add_query_param("status", "booked")
        .add_header(bearer_name(), bearer(&a1))
        .await;
    a1_booked.assert_status_ok();
    let a1_booked = a1_booked.json::<Value>();
    assert_eq!(a1_booked["count"], json!(0));
    assert_eq!(a1_booked["data"], json!([]));

    let a1_cancelled = app
        .server
        .get("/api/student/appointments")
        .add_query_param("status", "cancelled")
        .add_header(bearer_name(), bearer(&a1))
        .await;
    assert_eq!(a1_cancelled.json::<Value>()["count"], json!(1));
}

#[tokio::test]
async fn test_professor_cannot_book() {
    let app = TestApp::new();
    let (p1_id, p1) = app.signed_in("ProfessorP1", true).await;
    let t1 = app.publish_slot(&p1, 2).await;

    let response = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&p1))
        .json(&booking(p1_id, t1))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[rstest]
#[case(json!({"slot_id": 1, "reason": "Need help with course topics"}), "professor id is required")]
#[case(json!({"professor_id": 1, "reason": "Need help with course topics"}), "slot id is required")]
#[case(json!({"professor_id": 1, "slot_id": "abc", "reason": "Need help with course topics"}), "slot id should be a number")]
#[tokio::test]
async fn test_booking_rejects_malformed_ids(#[case] body: Value, #[case] message: &str) {
    let app = TestApp::new();
    let (_, a1) = app.signed_in("StudentA1", false).await;

    let response = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], json!(message));
}

#[tokio::test]
async fn test_short_reason_is_rejected() {
    let app = TestApp::new();
    let (p1_id, p1) = app.signed_in("ProfessorP1", true).await;
    let (_, a1) = app.signed_in("StudentA1", false).await;
    let t1 = app.publish_slot(&p1, 2).await;

    let response = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&json!({ "professor_id": p1_id, "slot_id": t1, "reason": "help" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!app.store.find_slot(p1_id, t1).await.unwrap().unwrap().is_booked);
}

#[tokio::test]
async fn test_expired_slot_cannot_be_booked() {
    let app = TestApp::new();
    let (p1_id, _) = app.signed_in("ProfessorP1", true).await;
    let (_, a1) = app.signed_in("StudentA1", false).await;
    let expired = app
        .store
        .create_slot(p1_id, Utc::now() - Duration::minutes(5))
        .await
        .unwrap();

    let response = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&booking(p1_id, expired.id))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], json!("slot is expired"));
}

#[tokio::test]
async fn test_student_cancels_own_appointment_once() {
    let app = TestApp::new();
    let (p1_id, p1) = app.signed_in("ProfessorP1", true).await;
    let (_, a1) = app.signed_in("StudentA1", false).await;
    let (_, a2) = app.signed_in("StudentA2", false).await;
    let t1 = app.publish_slot(&p1, 2).await;

    let booked = app
        .server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&a1))
        .json(&booking(p1_id, t1))
        .await
        .json::<Value>();
    let path = format!("/api/appointments/{}/cancel", booked["data"]["id"]);

    let stranger = app
        .server
        .post(&path)
        .add_header(bearer_name(), bearer(&a2))
        .await;
    stranger.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        stranger.json::<Value>()["message"],
        json!("Appointment doesn't exist")
    );

    let first = app
        .server
        .post(&path)
        .add_header(bearer_name(), bearer(&a1))
        .await;
    first.assert_status_ok();

    let second = app
        .server
        .post(&path)
        .add_header(bearer_name(), bearer(&a1))
        .await;
    second.assert_status_ok();
    assert_eq!(first.json::<Value>(), second.json::<Value>());
    assert_eq!(second.json::<Value>()["data"]["status"], json!("cancelled"));
}

#[tokio::test]
async fn test_cancel_with_malformed_id() {
    let app = TestApp::new();
    let (_, a1) = app.signed_in("StudentA1", false).await;

    let response = app
        .server
        .post("/api/appointments/abc/cancel")
        .add_header(bearer_name(), bearer(&a1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("appointment id should be a number")
    );
}

#[tokio::test]
async fn test_listing_validates_status_then_role() {
    let app = TestApp::new();
    let (_, p1) = app.signed_in("ProfessorP1", true).await;

    let bad_status = app
        .server
        .get("/api/student/appointments")
        .add_query_param("status", "pending")
        .add_header(bearer_name(), bearer(&p1))
        .await;
    bad_status.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(bad_status.json::<Value>()["message"], json!("status is not valid"));

    let wrong_role = app
        .server
        .get("/api/student/appointments")
        .add_header(bearer_name(), bearer(&p1))
        .await;
    wrong_role.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        wrong_role.json::<Value>()["message"],
        json!("this api is only for students to get the appointments")
    );
}
