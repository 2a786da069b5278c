use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{at, bearer, bearer_name, rfc3339_in, TestApp};

#[tokio::test]
async fn test_professor_publishes_slot() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("ProfessorP1", true).await;

    let response = app
        .server
        .post("/api/slots")
        .add_header(bearer_name(), bearer(&token))
        .json(&json!({ "slot": rfc3339_in(2) }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["message"], json!("slot is created successfully"));
    assert_eq!(body["data"]["is_booked"], json!(false));
}

#[tokio::test]
async fn test_student_cannot_publish_slot() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("StudentA1", false).await;

    let response = app
        .server
        .post("/api/slots")
        .add_header(bearer_name(), bearer(&token))
        .json(&json!({ "slot": rfc3339_in(2) }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("you are not authorised to create a slot")
    );
}

#[tokio::test]
async fn test_slot_window_and_duplicates() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("ProfessorP1", true).await;
    let post = |slot: Value| {
        app.server
            .post("/api/slots")
            .add_header(bearer_name(), bearer(&token))
            .json(&json!({ "slot": slot }))
    };

    let past = post(json!(rfc3339_in(-1))).await;
    past.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(past.json::<Value>()["message"], json!("slot shouldn't be in past"));

    let far = post(json!(at(Utc::now() + Duration::days(400)))).await;
    far.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        far.json::<Value>()["message"],
        json!("slot shouldn't be more than 1 year in gap")
    );

    let garbage = post(json!("next tuesday")).await;
    garbage.assert_status(StatusCode::BAD_REQUEST);

    let when = rfc3339_in(3);
    post(json!(when)).await.assert_status(StatusCode::CREATED);
    let duplicate = post(json!(when)).await;
    duplicate.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        duplicate.json::<Value>()["message"],
        json!("slot already exist on same time")
    );
}

#[tokio::test]
async fn test_list_professor_slots_ascending() {
    let app = TestApp::new();
    let (_, professor) = app.signed_in("ProfessorP1", true).await;
    let (_, student) = app.signed_in("StudentA1", false).await;
    let later = app.publish_slot(&professor, 4).await;
    let sooner = app.publish_slot(&professor, 2).await;

    let response = app
        .server
        .get("/api/professors/ProfessorP1/slots")
        .add_header(bearer_name(), bearer(&student))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["count"], json!(2));
    assert!(body["data"].get("count").is_none());
    assert_eq!(body["data"]["professor"]["username"], json!("ProfessorP1"));
    assert_eq!(body["data"]["slots"][0]["id"], json!(sooner));
    assert_eq!(body["data"]["slots"][1]["id"], json!(later));
}

#[tokio::test]
async fn test_list_slots_of_non_professor() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("StudentA1", false).await;

    let student = app
        .server
        .get("/api/professors/StudentA1/slots")
        .add_header(bearer_name(), bearer(&token))
        .await;
    student.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        student.json::<Value>()["message"],
        json!("the name is not related to a professor")
    );

    let unknown = app
        .server
        .get("/api/professors/Ghost/slots")
        .add_header(bearer_name(), bearer(&token))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_slot() {
    let app = TestApp::new();
    let (_, professor) = app.signed_in("ProfessorP1", true).await;
    let (_, other) = app.signed_in("ProfessorP2", true).await;
    let slot_id = app.publish_slot(&professor, 2).await;
    let path = format!("/api/slots/{}", slot_id);

    let foreign = app
        .server
        .delete(&path)
        .add_header(bearer_name(), bearer(&other))
        .await;
    foreign.assert_status(StatusCode::NOT_FOUND);

    let malformed = app
        .server
        .delete("/api/slots/abc")
        .add_header(bearer_name(), bearer(&professor))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        malformed.json::<Value>()["message"],
        json!("slot id should be a number")
    );

    let deleted = app
        .server
        .delete(&path)
        .add_header(bearer_name(), bearer(&professor))
        .await;
    deleted.assert_status_ok();
    assert_eq!(deleted.json::<Value>()["message"], json!("slot is deleted successfully"));

    let listing = app
        .server
        .get("/api/professors/ProfessorP1/slots")
        .add_header(bearer_name(), bearer(&professor))
        .await;
    assert_eq!(listing.json::<Value>()["count"], json!(0));
}

#[tokio::test]
async fn test_booked_slot_cannot_be_deleted() {
    let app = TestApp::new();
    let (professor_id, professor) = app.signed_in("ProfessorP1", true).await;
    let (_, student) = app.signed_in("StudentA1", false).await;
    let slot_id = app.publish_slot(&professor, 2).await;

    app.server
        .post("/api/appointments")
        .add_header(bearer_name(), bearer(&student))
        .json(&json!({
            "professor_id": professor_id,
            "slot_id": slot_id,
            "reason": "Need help with course topics",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .delete(&format!("/api/slots/{}", slot_id))
        .add_header(bearer_name(), bearer(&professor))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}
