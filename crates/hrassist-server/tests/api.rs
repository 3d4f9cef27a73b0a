//! HTTP API tests. Each test builds the full router over a temporary data
//! directory and drives it with `oneshot`, no listener needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tower::ServiceExt;

use hrassist_chat::{GuardedGenerator, LLMConfig, TextGenerator};
use hrassist_core::AppConfig;
use hrassist_engine::QaEngine;
use hrassist_infer::HashEmbedder;
use hrassist_server::{build_router, AppState};
use hrassist_store::{QaDataset, QaPair};

struct Echo;

#[async_trait]
impl TextGenerator for Echo {
    async fn generate(&self, _prompt: &str) -> hrassist_core::Result<String> {
        Ok("generated".into())
    }
    fn describe(&self) -> String {
        "echo".into()
    }
}

/// Answers with one QA pair, but only once the test opens the gate.
struct Gated {
    gate: Semaphore,
}

#[async_trait]
impl TextGenerator for Gated {
    async fn generate(&self, _prompt: &str) -> hrassist_core::Result<String> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| hrassist_core::Error::Generation(e.to_string()))?;
        Ok("Question: Can I carry over unused leave?\nAnswer: Up to five days.".into())
    }
    fn describe(&self) -> String {
        "gated".into()
    }
}

struct TestApp {
    dir: tempfile::TempDir,
    router: Router,
}

async fn app(with_generator: bool) -> TestApp {
    let generator: Option<Arc<dyn TextGenerator>> = if with_generator {
        Some(Arc::new(Echo))
    } else {
        None
    };
    app_with(generator).await
}

async fn app_with(generator: Option<Arc<dyn TextGenerator>>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::from_lookup(dir.path(), |_| None).unwrap();
    QaDataset::new(vec![
        QaPair::new("How many sick days do I get?", "Ten paid sick days per year.")
            .with_source("HR Policy: leave"),
        QaPair::new("How do I reset my password?", "Use the self-service IT portal."),
    ])
    .save(&config.data_paths.qa_dataset)
    .unwrap();

    let generator = generator.map(|g| GuardedGenerator::new(g, &config.company.hr_email));
    let engine = QaEngine::new(&config, Arc::new(HashEmbedder::new(128)), generator);
    engine.reload().await.unwrap();

    let llm_config = LLMConfig::load_with(&config.data_paths.llm_config_file, |_| None);
    let state = Arc::new(AppState::new(config, engine, llm_config));
    TestApp {
        dir,
        router: build_router(state),
    }
}

async fn call(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn chat(app: &TestApp, session: &str, message: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": message, "session_id": session})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_health() {
    let app = app(false).await;
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["engine"]["qa_pairs"], 2);
    assert_eq!(body["llm"]["gemini_configured"], false);

    let (status, body) = call(&app, Method::GET, "/api/chat/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["semantic_search"], true);
    assert_eq!(body["llm_available"], false);
}

#[tokio::test]
async fn test_chat_exact_match() {
    let app = app(true).await;
    let body = chat(&app, "s1", "How do I reset my password?").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Use the self-service IT portal.");
    assert_eq!(body["route"], "exact");
    assert_eq!(body["session_id"], "s1");
    assert!(body["timestamp"].is_string());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_chat_mints_session_id() {
    let app = app(false).await;
    let (status, body) =
        call(&app, Method::POST, "/api/chat", Some(json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], "greeting");
    assert!(!body["session_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_bad_input() {
    let app = app(false).await;
    for message in [
        json!("   "),
        json!("<script>alert('x')</script>"),
        json!("x".repeat(10_001)),
    ] {
        let (status, body) =
            call(&app, Method::POST, "/api/chat", Some(json!({"message": message}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_chat_document_flow() {
    let app = app(false).await;
    let list = chat(&app, "alice", "Which documents can I request?").await;
    assert_eq!(list["route"], "document_list");

    let form = chat(&app, "alice", "13").await;
    assert_eq!(form["response"], "SHOW_FORM:13:ID Card Replacement");

    let other = chat(&app, "bob", "Name: Bob, Employee ID: E9, Reason: lost").await;
    assert_ne!(other["route"], "document_submitted");

    let done = chat(&app, "alice", "Name: Alice, Employee ID: E1, Reason: damaged").await;
    assert_eq!(done["route"], "document_submitted");

    let (_, mine) = call(&app, Method::GET, "/api/document-requests/user/alice", None).await;
    assert_eq!(mine["count"], 1);
    let id = mine["requests"][0]["request_id"].as_str().unwrap().to_string();

    let (status, request) =
        call(&app, Method::GET, &format!("/api/document-requests/status/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["document_name"], "ID Card Replacement");
    assert_eq!(request["status"], "pending");
}

#[tokio::test]
async fn test_document_submit_endpoint() {
    let app = app(false).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/document-requests/submit",
        Some(json!({
            "document_type": 16,
            "details": {"name": "Asha", "employeeId": "E7", "destination": "Berlin",
                        "travelDates": "1-9 May"},
            "user_id": "asha",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["request_id"].as_str().unwrap().starts_with("DOC-"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/document-requests/submit",
        Some(json!({"document_type": "16", "details": "Name: Asha"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("employee_id"));

    let (_, body) = call(&app, Method::GET, "/api/document-requests/pending/count", None).await;
    assert_eq!(body["pending_count"], 1);

    let (status, _) =
        call(&app, Method::GET, "/api/document-requests/status/DOC-NOPE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/document-requests/documents/list", None).await;
    assert_eq!(body["count"], 16);
    assert_eq!(body["documents"][6]["name"], "Salary Slips");
}

#[tokio::test]
async fn test_suggestions_and_feedback() {
    let app = app(false).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/suggestions",
        Some(json!({"query": "How many sick days do I get?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["source"], "HR Policy: leave");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/feedback",
        Some(json!({"question": "How many sick days do I get?", "feedback": "awesome"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/feedback",
        Some(json!({"question": "Unknown?", "feedback": "correct"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/feedback",
        Some(json!({"question": "How many sick days do I get?", "feedback": "incorrect"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = call(&app, Method::GET, "/api/advanced-qa/statistics", None).await;
    assert_eq!(stats["total_qa_pairs"], 2);
    assert_eq!(stats["needs_review"], 1);
}

#[tokio::test]
async fn test_generate_qa_needs_generator() {
    let app = app(false).await;
    let (status, _) = call(&app, Method::POST, "/api/advanced-qa/generate-qa", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_reload() {
    let app = app(true).await;
    let (status, body) = call(&app, Method::POST, "/api/advanced-qa/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qa_pairs"], 2);
    assert_eq!(body["semantic_search"], true);
}

#[tokio::test]
async fn test_enhanced_answer_uses_chat_flow() {
    let app = app(false).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/enhanced-answer",
        Some(json!({"query": "How many sick days do I get?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], "exact");
    assert_eq!(body["answer"], "Ten paid sick days per year.");
    assert_eq!(body["related_questions"][0]["question"], "How many sick days do I get?");

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/enhanced-answer",
        Some(json!({"query": "hello", "session_id": "s9"})),
    )
    .await;
    assert_eq!(body["route"], "greeting");
    assert_eq!(body["session_id"], "s9");

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/advanced-qa/enhanced-answer",
        Some(json!({"query": "I need a document"})),
    )
    .await;
    assert_eq!(body["route"], "document_list");
}

#[tokio::test]
async fn test_generate_qa_runs_in_background() {
    let generator = Arc::new(Gated {
        gate: Semaphore::new(0),
    });
    let app = app_with(Some(generator.clone() as Arc<dyn TextGenerator>)).await;
    std::fs::write(
        app.dir.path().join("policies").join("leave.txt"),
        "Unused annual leave can be carried over into the next year. ".repeat(5),
    )
    .unwrap();

    let (status, body) = call(&app, Method::POST, "/api/advanced-qa/generate-qa", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);

    let (status, _) = call(&app, Method::POST, "/api/advanced-qa/generate-qa", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status_body) =
        call(&app, Method::GET, "/api/advanced-qa/generate-qa/status", None).await;
    assert_eq!(status_body["running"], true);

    generator.gate.add_permits(1);
    let mut report = Value::Null;
    for _ in 0..200 {
        let (_, body) = call(&app, Method::GET, "/api/advanced-qa/generate-qa/status", None).await;
        if body["running"] == false {
            report = body;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(report["finished_at"].is_string());
    assert!(report.get("error").is_none());
    assert_eq!(report["report"]["files_processed"], 1);
    assert_eq!(report["report"]["pairs_added"], 1);
    assert_eq!(report["report"]["total_pairs"], 3);

    let answer = chat(&app, "s1", "Can I carry over unused leave?").await;
    assert_eq!(answer["route"], "exact");
    assert_eq!(answer["response"], "Up to five days.");
}

const BOUNDARY: &str = "hrassist-test-boundary";

async fn upload(app: &TestApp, filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
         filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/documents/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_upload_rejects_bad_files() {
    let app = app(false).await;

    let (status, body) = upload(&app, "notes.txt", b"plain text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PDF files are supported");

    let (status, body) = upload(&app, "empty.pdf", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File is empty");

    let (status, body) = upload(&app, "broken.pdf", b"%PDF-1.4 not really a pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to extract text from PDF"));
}
