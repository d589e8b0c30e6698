mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use spellbook_api::gateway::{JobQueue, ObjectStore, SignedMethod};
use spellbook_core::domain::job::result_key;
use uuid::Uuid;

use common::{TestApp, USER, request, sample_quiz};

async fn submit(app: &TestApp, class_id: &str, num_questions: u32) -> Uuid {
    let (status, body) = app
        .post(
            "/jobs",
            json!({ "classId": class_id, "numQuestions": num_questions }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["jobId"].as_str().unwrap().parse().unwrap()
}

async fn write_result(app: &TestApp, job_id: Uuid, body: Vec<u8>) {
    app.store
        .put_bytes(&result_key(&app.config.result_prefix, job_id), body)
        .await
        .unwrap();
}

// =============================================================================
// Health and identity
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.send(request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_owner_header_is_required() {
    let app = TestApp::new();

    let (status, body) = app
        .send(request(
            "POST",
            "/jobs",
            None,
            Some(json!({ "classId": Uuid::new_v4(), "numQuestions": 5 })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = app.send(request("GET", "/classes", Some("  "), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Job submission
// =============================================================================

#[tokio::test]
async fn test_submit_job_enqueues_descriptor() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(3).await;

    let (status, body) = app
        .post(
            "/jobs",
            json!({ "classId": class_id, "numQuestions": 5, "topics": ["mitosis"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id: Uuid = body["jobId"].as_str().unwrap().parse().unwrap();

    let head = app.queue.peek().await.unwrap().unwrap();
    assert_eq!(head.job_id, job_id);
    assert_eq!(head.input_refs.len(), 3);
    assert_eq!(head.parameters.topics, vec!["mitosis"]);

    let (status, snapshot) = app.get("/admin/queue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["size"], 1);
    assert_eq!(snapshot["head"]["jobUuid"], job_id.to_string());
    assert_eq!(snapshot["head"]["numQuestions"], 5);
    assert_eq!(snapshot["head"]["noteKeys"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_submit_job_validation() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(1).await;

    let (status, _) = app.post("/jobs", json!({ "numQuestions": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/jobs", json!({ "classId": class_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/jobs", json!({ "classId": class_id, "numQuestions": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/jobs", json!({ "classId": "not-a-uuid", "numQuestions": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.queue.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_submit_job_for_missing_inputs() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/jobs", json!({ "classId": Uuid::new_v4(), "numQuestions": 5 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let empty_class = app.class_with_notes(0).await;
    let (status, body) = app
        .post("/jobs", json!({ "classId": empty_class, "numQuestions": 5 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no notes"));

    assert_eq!(app.queue.size().await.unwrap(), 0);
    assert_eq!(app.records.job_count().await, 0);
}

// =============================================================================
// Status and result
// =============================================================================

#[tokio::test]
async fn test_status_turns_ready_when_result_exists() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(2).await;
    let job_id = submit(&app, &class_id, 3).await;

    for _ in 0..3 {
        let (status, body) = app.get(&format!("/jobs/{}/status", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ready": false }));
    }

    let (status, _) = app.get(&format!("/jobs/{}/result", job_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    write_result(&app, job_id, sample_quiz().to_string().into_bytes()).await;

    let (_, body) = app.get(&format!("/jobs/{}/status", job_id)).await;
    assert_eq!(body, json!({ "ready": true }));

    let (status, body) = app.get(&format!("/jobs/{}/result", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], sample_quiz());
}

#[tokio::test]
async fn test_malformed_result_is_a_server_error() {
    let app = TestApp::new();
    let job_id = Uuid::new_v4();
    write_result(&app, job_id, b"{\"questions\": 7}".to_vec()).await;

    let (status, body) = app.get(&format!("/jobs/{}/result", job_id)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("malformed"));
    assert_eq!(body["code"], "malformed_result");
}

// =============================================================================
// Scores
// =============================================================================

#[tokio::test]
async fn test_score_is_recorded_once() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(1).await;
    let job_id = submit(&app, &class_id, 5).await;
    let uri = format!("/jobs/{}/score", job_id);

    let (status, body) = app.post(&uri, json!({ "score": 80 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 80.0);

    let (status, _) = app.post(&uri, json!({ "score": 20 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get(&format!("/classes/{}/scores", class_id)).await;
    assert_eq!(status, StatusCode::OK);
    let scores = body["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["jobId"], job_id.to_string());
    assert_eq!(scores[0]["score"], 80.0);
}

#[tokio::test]
async fn test_score_validation() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(1).await;
    let job_id = submit(&app, &class_id, 5).await;
    let uri = format!("/jobs/{}/score", job_id);

    for body in [json!({ "score": 101 }), json!({ "score": -5 }), json!({})] {
        let (status, _) = app.post(&uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post(&format!("/jobs/{}/score", Uuid::new_v4()), json!({ "score": 50 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Review topics
// =============================================================================

#[tokio::test]
async fn test_review_topics_for_wrong_answers() {
    let app = TestApp::new();
    let job_id = Uuid::new_v4();
    write_result(&app, job_id, sample_quiz().to_string().into_bytes()).await;
    let uri = format!("/jobs/{}/review", job_id);

    let (status, body) = app
        .post(&uri, json!({ "wrongQuestionIndices": [0, 2] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["topics"],
        json!([
            { "topic": "Mitochondria", "importance": "Missed: Powerhouse of the cell?" },
            { "topic": "Double helix", "importance": "Missed: DNA shape?" }
        ])
    );

    let (status, _) = app.post(&uri, json!({ "wrongQuestionIndices": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&uri, json!({ "wrongQuestionIndices": [3] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &format!("/jobs/{}/review", Uuid::new_v4()),
            json!({ "wrongQuestionIndices": [0] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Classes and notes
// =============================================================================

#[tokio::test]
async fn test_classes_are_scoped_to_owner() {
    let app = TestApp::new();
    app.class_with_notes(0).await;

    let (status, body) = app.get("/classes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["userId"], USER);

    let (_, body) = app
        .send(request("GET", "/classes", Some("someone-else"), None))
        .await;
    assert_eq!(body, json!({ "data": [], "total": 0 }));

    let (status, _) = app.post("/classes", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_class_listing_reports_notes_and_scores() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(2).await;
    for score in [60, 90] {
        let job_id = submit(&app, &class_id, 5).await;
        let (status, _) = app
            .post(&format!("/jobs/{}/score", job_id), json!({ "score": score }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    app.class_with_notes(0).await;

    let (status, body) = app.get("/classes?page=1&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let newest = &body["data"][0];
    assert_ne!(newest["id"], class_id.as_str());
    assert_eq!(newest["notesCount"], 0);
    assert_eq!(newest["totalQuizScores"], 0);
    assert_eq!(newest["averageQuizScore"], 0.0);

    let (_, body) = app.get("/classes?page=2&limit=1").await;
    let oldest = &body["data"][0];
    assert_eq!(oldest["id"], class_id.as_str());
    assert_eq!(oldest["notesCount"], 2);
    assert_eq!(oldest["totalQuizScores"], 2);
    assert_eq!(oldest["averageQuizScore"], 75.0);

    let (status, _) = app.get("/classes?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_single_class() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(1).await;
    let uri = format!("/classes/{}", class_id);

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], class_id.as_str());
    assert_eq!(body["name"], "Biology");
    assert_eq!(body["notesCount"], 1);
    assert_eq!(body["totalQuizScores"], 0);

    let (status, _) = app.send(request("GET", &uri, Some("someone-else"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/classes/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/classes/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_note_lifecycle() {
    let app = TestApp::new();
    let class_id = app.class_with_notes(0).await;
    let notes_uri = format!("/classes/{}/notes", class_id);

    let (status, body) = app.post(&notes_uri, json!({ "numberOfFiles": 3 })).await;
    assert_eq!(status, StatusCode::OK);
    let uploads = body["uploads"].as_array().unwrap().clone();
    assert_eq!(uploads.len(), 3);
    let key = uploads[0]["key"].as_str().unwrap().to_string();
    assert!(uploads[0]["uploadUrl"].as_str().unwrap().contains(&key));

    let (status, body) = app.get(&format!("{}?page=1&limit=2", notes_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["notes"].as_array().unwrap().len(), 2);
    assert_eq!(body["notes"][0]["key"], key);

    app.store
        .put_bytes(&format!("processed/{}", key), b"recognised text".to_vec())
        .await
        .unwrap();
    let (status, body) = app.get(&format!("{}/status", notes_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "processedNotes": 1, "unprocessedNotes": 2, "totalNotes": 3 })
    );

    let delete_uri = format!("{}/{}", notes_uri, key);
    let (status, _) = app
        .send(request("DELETE", &delete_uri, Some(USER), None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(request("DELETE", &delete_uri, Some(USER), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post(&notes_uri, json!({ "numberOfFiles": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get(&format!("{}?limit=500", notes_uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Signed blob access
// =============================================================================

fn path_of(url: &str) -> String {
    url.trim_start_matches("http://localhost:8080").to_string()
}

#[tokio::test]
async fn test_signed_put_then_get() {
    let app = TestApp::new();
    let put_url = app
        .signer
        .sign(SignedMethod::Put, "notes/page-1", std::time::Duration::from_secs(60))
        .unwrap();

    let response = app
        .send(
            Request::builder()
                .method("PUT")
                .uri(path_of(&put_url))
                .body(Body::from("page bytes"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.0, StatusCode::OK);

    let get_url = app
        .signer
        .sign(SignedMethod::Get, "notes/page-1", std::time::Duration::from_secs(60))
        .unwrap();
    let (status, body) = app.send(request("GET", &path_of(&get_url), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("page bytes"));

    // A PUT URL does not grant reads
    let (status, _) = app.send(request("GET", &path_of(&put_url), None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blob_signature_checks() {
    let app = TestApp::new();
    app.store
        .put_bytes("notes/page-2", b"secret".to_vec())
        .await
        .unwrap();

    let (status, _) = app.send(request("GET", "/blobs/notes/page-2", None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let url = app
        .signer
        .sign(SignedMethod::Get, "notes/page-2", std::time::Duration::from_secs(60))
        .unwrap();
    let tampered = path_of(&url).replace("page-2", "page-3");
    let (status, _) = app.send(request("GET", &tampered, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let expired = app
        .signer
        .sign_until(SignedMethod::Get, "notes/page-2", 1_000)
        .unwrap();
    let (status, body) = app.send(request("GET", &path_of(&expired), None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("expired"));
}
