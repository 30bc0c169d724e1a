//! Mock HTTP tests for KlingClient.
//!
//! These tests cover:
//! - Submission request formatting and authorization
//! - Envelope and status parsing
//! - Poll loop sequencing and attempt budgets
//! - Video download streaming
//! - Error handling for rejected and malformed responses

use std::time::Duration;

use hookgen::kling::{KlingClient, KlingError, TaskState, MODEL_NAME};

use wiremock::matchers::{body_partial_json, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> KlingClient {
    KlingClient::with_base_url("test-ak".to_string(), "test-sk".to_string(), server.uri())
        .unwrap()
}

// === Submission Tests ===

#[tokio::test]
async fn test_submit_sends_bearer_token_and_fixed_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .and(header_regex("Authorization", r"^Bearer .+"))
        .and(body_partial_json(serde_json::json!({
            "model_name": MODEL_NAME,
            "mode": "std",
            "duration": "5",
            "image": "https://tmpfiles.org/dl/1/face.png",
            "prompt": "a subtle smile",
            "cfg_scale": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "message": "SUCCEED",
            "data": {"task_id": "task-abc"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let task_id = client
        .submit("https://tmpfiles.org/dl/1/face.png", "a subtle smile")
        .await
        .unwrap();

    assert_eq!(task_id, "task-abc");
}

#[tokio::test]
async fn test_submit_nonzero_code_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1201,
            "message": "invalid auth"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.submit("https://example.com/img.png", "prompt").await;

    match result {
        Err(KlingError::Api(msg)) => {
            assert!(msg.contains("1201"));
            assert!(msg.contains("invalid auth"));
        }
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_submit_http_error_status_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.submit("https://example.com/img.png", "prompt").await;

    match result {
        Err(KlingError::Api(msg)) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("rate limited"));
        }
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_submit_missing_task_id_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": 0, "message": "SUCCEED"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.submit("https://example.com/img.png", "prompt").await;

    assert!(matches!(result, Err(KlingError::Api(_))));
}

#[tokio::test]
async fn test_submit_malformed_json_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.submit("https://example.com/img.png", "prompt").await;

    assert!(matches!(result, Err(KlingError::Http(_))));
}

// === Status Query Tests ===

#[tokio::test]
async fn test_query_task_succeed_with_video_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-1"))
        .and(header_regex("Authorization", r"^Bearer .+"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {
                "task_status": "succeed",
                "task_result": {"videos": [{"url": "https://cdn.example.com/v.mp4"}]}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let state = client.query_task("task-1").await.unwrap();

    assert_eq!(
        state,
        TaskState::Succeeded {
            video_url: "https://cdn.example.com/v.mp4".to_string()
        }
    );
}

#[tokio::test]
async fn test_query_task_succeed_without_videos_is_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {
                "task_status": "succeed",
                "task_result": {"videos": []}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let state = client.query_task("task-2").await.unwrap();

    assert_eq!(state, TaskState::Pending);
}

#[tokio::test]
async fn test_query_task_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {"task_status": "failed"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let state = client.query_task("task-3").await.unwrap();

    assert_eq!(state, TaskState::Failed);
}

#[tokio::test]
async fn test_query_task_processing_is_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {"task_status": "processing"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let state = client.query_task("task-4").await.unwrap();

    assert_eq!(state, TaskState::Pending);
}

#[tokio::test]
async fn test_query_task_nonzero_code_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": 1100, "message": "account issue"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.query_task("task-5").await;

    assert!(matches!(result, Err(KlingError::Api(_))));
}

// === Poll Loop Tests ===

#[tokio::test]
async fn test_wait_for_completion_polls_until_succeed() {
    let mock_server = MockServer::start().await;

    // Three pending responses, then one success.
    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {"task_status": "processing"}
        })))
        .up_to_n_times(3)
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {
                "task_status": "succeed",
                "task_result": {"videos": [{"url": "https://cdn.example.com/done.mp4"}]}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .wait_for_completion_with("task-6", 10, Duration::from_millis(1))
        .await;

    assert_eq!(result, Some("https://cdn.example.com/done.mp4".to_string()));
}

#[tokio::test]
async fn test_wait_for_completion_stops_on_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {"task_status": "failed"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .wait_for_completion_with("task-7", 10, Duration::from_millis(1))
        .await;

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_wait_for_completion_exhausts_attempt_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {"task_status": "processing"}
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .wait_for_completion_with("task-8", 3, Duration::from_millis(1))
        .await;

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_wait_for_completion_poll_error_counts_as_attempt() {
    let mock_server = MockServer::start().await;

    // One server error, then success; the loop must survive the error.
    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-9"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/videos/image2video/task-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "data": {
                "task_status": "succeed",
                "task_result": {"videos": [{"url": "https://cdn.example.com/late.mp4"}]}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .wait_for_completion_with("task-9", 5, Duration::from_millis(1))
        .await;

    assert_eq!(result, Some("https://cdn.example.com/late.mp4".to_string()));
}

// === Download Tests ===

#[tokio::test]
async fn test_download_video_writes_bytes_to_dest() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/result.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 bytes".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("face-happy.mp4");

    let client = client_for(&mock_server);
    let url = format!("{}/videos/result.mp4", mock_server.uri());
    let written = client.download_video(&url, &dest).await.unwrap();

    assert_eq!(written, dest);
    let bytes = std::fs::read(&dest).unwrap();
    assert_eq!(bytes, b"fake mp4 bytes");
}

#[tokio::test]
async fn test_download_video_404_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/gone.mp4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("gone.mp4");

    let client = client_for(&mock_server);
    let url = format!("{}/videos/gone.mp4", mock_server.uri());
    let result = client.download_video(&url, &dest).await;

    assert!(matches!(result, Err(KlingError::Api(_))));
    assert!(!dest.exists());
}
