//! Integration tests for the HTTP transport
//!
//! Validates request encoding and error normalization using mock servers

use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

use docsum_engine::transport::{
    Endpoint, Form, HttpTransport, Response, ResponseKind, Transport, TransportErrorKind,
};
use docsum_sdk::types::{QueryAnswer, UploadReceipt};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(format!("{}/api", server.uri())).unwrap()
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"file\"; filename=\"notes.txt\""))
        .and(body_string_contains("Paris is the capital"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "File uploaded and indexed",
            "file_id": "f-1",
            "filename": "notes.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let form = Form::new().file("file", "notes.txt", b"Paris is the capital".to_vec());

    let receipt: UploadReceipt = transport
        .send(Endpoint::Upload, Some(form), ResponseKind::Json)
        .await
        .unwrap()
        .into_json()
        .unwrap();

    assert_eq!(receipt.message, "File uploaded and indexed");
    assert_eq!(receipt.filename.as_deref(), Some("notes.txt"));
}

#[tokio::test]
async fn test_query_sends_text_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_string_contains("name=\"query\""))
        .and(body_string_contains("capital of France?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Paris is the capital",
            "query": "capital of France?",
            "context": [{"text": "Paris", "score": 0.91}]
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let answer: QueryAnswer = transport
        .send(
            Endpoint::Query,
            Some(Form::new().text("query", "capital of France?")),
            ResponseKind::Json,
        )
        .await
        .unwrap()
        .into_json()
        .unwrap();

    assert_eq!(answer.answer, "Paris is the capital");
    // Unknown chunk fields are kept
    assert_eq!(answer.context[0].extra.get("score"), Some(&json!(0.91)));
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "index not found"})))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .send(Endpoint::Query, Some(Form::new().text("query", "q")), ResponseKind::Json)
        .await
        .unwrap_err();

    assert_eq!(err.message, "index not found");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_error_without_detail_uses_status_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .send(Endpoint::Summarize, None, ResponseKind::Json)
        .await
        .unwrap_err();

    assert_eq!(err.message, "Request failed with status code 500");
    assert_eq!(err.kind, TransportErrorKind::Server { status: 500 });
}

#[tokio::test]
async fn test_binary_response_is_returned_untouched() {
    let server = MockServer::start().await;
    let pdf = b"%PDF-1.4\n\x00\xff binary".to_vec();

    Mock::given(method("POST"))
        .and(path("/api/download/pdf"))
        .and(body_string_contains("Document Summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf.clone()),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let form = Form::new()
        .text("content", "All about Paris.")
        .text("title", "Document Summary");

    let response = transport
        .send(Endpoint::ExportPdf, Some(form), ResponseKind::Binary)
        .await
        .unwrap();

    assert_eq!(response, Response::Binary(pdf));
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .send(Endpoint::Summarize, None, ResponseKind::Json)
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Decode);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let server = MockServer::start().await;
    let base = format!("{}/api", server.uri());
    // Nothing listens on the port once the server is gone
    drop(server);

    let transport = HttpTransport::new(base.clone()).unwrap();
    let err = transport
        .send(Endpoint::Summarize, None, ResponseKind::Json)
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Network);
    assert_eq!(
        err.message,
        format!("Cannot connect to document server at {}. Is it running?", base)
    );
}
