//! Integration tests for the Anthropic client against a local stub server.

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use paygate_core::error::ErrorCode;
use paygate_core::types::Document;
use paygate_llm::{AnthropicModel, DocumentModel, ModelConfig};

/// Serve one canned HTTP response and hand back the raw request.
async fn stub_server(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(request);
    });

    (format!("http://{}/v1", addr), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn model(base_url: String, timeout_secs: u64) -> AnthropicModel {
    AnthropicModel::new(ModelConfig {
        api_key: Some(SecretString::new("sk-test-key".to_string())),
        base_url: Some(base_url),
        timeout_secs,
        ..Default::default()
    })
    .unwrap()
}

fn pdf() -> Document {
    Document::from_bytes(b"%PDF-1.7\n%stub\n".to_vec()).unwrap()
}

#[tokio::test]
async fn test_successful_response() {
    let (url, request) = stub_server(
        "200 OK",
        r#"{"id":"msg_1","type":"message","model":"claude-sonnet-4-20250514","stop_reason":"end_turn",
            "content":[{"type":"text","text":"{\"lineItems\": []}"}],
            "usage":{"input_tokens":1200,"output_tokens":40}}"#,
    )
    .await;

    let raw = model(url, 5).extract(&pdf(), "Extract the pay application").await.unwrap();
    assert_eq!(raw.text, r#"{"lineItems": []}"#);
    assert_eq!(raw.status, 200);
    assert_eq!(raw.stop_reason.as_deref(), Some("end_turn"));
    assert_eq!(raw.usage.unwrap().input_tokens, 1200);

    let request = request.await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(lower.starts_with("post /v1/messages"));
    assert!(lower.contains("x-api-key: sk-test-key"));
    assert!(lower.contains("anthropic-version: 2023-06-01"));
    assert!(request.contains("\"type\":\"document\""));
    assert!(request.contains("Extract the pay application"));
}

#[tokio::test]
async fn test_provider_error_status() {
    let (url, _request) = stub_server(
        "529 Site Overloaded",
        r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
    )
    .await;

    let err = model(url, 5).extract(&pdf(), "x").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpsProviderStatus);
    assert!(err.public_message().contains("529"));
    assert!(err.public_message().contains("Overloaded"));
}

#[tokio::test]
async fn test_no_text_content() {
    let (url, _request) = stub_server(
        "200 OK",
        r#"{"content":[],"stop_reason":"end_turn"}"#,
    )
    .await;

    let err = model(url, 5).extract(&pdf(), "x").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpsEmptyResponse);
}

#[tokio::test]
async fn test_undecodable_body_is_not_reported_as_empty() {
    let (url, _request) = stub_server("200 OK", "<html>upstream proxy error</html>").await;

    let err = model(url, 5).extract(&pdf(), "x").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpsUnreadableResponse);
    assert_eq!(err.code().as_str(), "UPS_006");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = model(format!("http://{}/v1", addr), 5)
        .extract(&pdf(), "x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpsTransport);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut socket).await;
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    });

    let err = model(format!("http://{}/v1", addr), 1)
        .extract(&pdf(), "x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpsTimeout);
}
