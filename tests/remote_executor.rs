use std::time::Duration;

use codepad::error::RunError;
use codepad::execution::{invoke, Artifact, Executor, InvocationController, RemoteExecutor};
use codepad::output::{ArtifactView, OutputState};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Request captured by the stub server.
struct Captured {
    request_line: String,
    body: Value,
}

/// Serve exactly one HTTP response on a fresh port. Returns the base URL and a handle
/// yielding the request that was received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        Captured {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null),
        }
    });

    (format!("http://{}", addr), handle)
}

fn executor(base: &str) -> RemoteExecutor {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    RemoteExecutor::with_client(client, base)
}

#[tokio::test]
async fn posts_code_and_decodes_variables() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"output":"Done and dusted\n","variables":{"x":{"type":"text","content":"5"},"df":{"type":"table","content":"<table><tr><th>a</th></tr><tr><td>1</td></tr></table>"}}}"#,
    )
    .await;

    let result = invoke(&executor(&base), "x = 5\nprint(x)", Some("200"))
        .await
        .unwrap();
    let captured = server.await.unwrap();

    assert_eq!(captured.request_line, "POST /api/run_code/200/ HTTP/1.1");
    assert_eq!(captured.body["code"], "x = 5\nprint(x)");

    assert_eq!(result.output, "Done and dusted");
    assert_eq!(result.variables.get("x"), Some(&Artifact::Text(Value::from("5"))));

    let mut state = OutputState::new();
    state.apply(result);
    state.select("df");
    let (name, artifact) = state.entries().next().unwrap();
    assert_eq!(name, "df");
    match ArtifactView::from_artifact(artifact) {
        ArtifactView::Table(tables) => {
            assert_eq!(tables[0].headers, vec!["a"]);
            assert_eq!(tables[0].rows, vec![vec!["1".to_string()]]);
        }
        other => panic!("expected a table, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_reports_status_text() {
    let (base, server) = serve_once("500 Internal Server Error", "{}").await;

    let err = executor(&base).execute("1/0", "7").await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, RunError::Remote { .. }));
    assert_eq!(err.user_message(), "Server error: Internal Server Error");
}

#[tokio::test]
async fn server_error_keeps_custom_reason_phrase() {
    let (base, server) = serve_once("500 Lesson sandbox unavailable", "{}").await;

    let err = executor(&base).execute("x", "7").await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err.user_message(), "Server error: Lesson sandbox unavailable");
}

#[tokio::test]
async fn malformed_body_is_a_connection_error() {
    let (base, server) = serve_once("200 OK", "not json").await;

    let err = executor(&base).execute("x", "7").await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, RunError::Decode(_)));
    assert_eq!(err.user_message(), "Error connecting to the server.");
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let err = executor(&format!("http://{}", addr))
        .execute("x", "7")
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Transport(_)));
    assert_eq!(err.user_message(), "Error connecting to the server.");
}

#[tokio::test]
async fn missing_lesson_number_never_reaches_the_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let err = invoke(&executor(&base), "x", None).await.unwrap_err();
    assert!(matches!(err, RunError::MissingContext));
    let err = invoke(&executor(&base), "x", Some("  ")).await.unwrap_err();
    assert!(matches!(err, RunError::MissingContext));

    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "no connection expected");
}

#[tokio::test]
async fn controller_allows_one_request_in_flight() {
    let (base, server) = serve_once("200 OK", r#"{"output":"ok","variables":{}}"#).await;
    let exec = executor(&base);
    let mut controller = InvocationController::new();

    let first = controller
        .start(exec.clone(), "a".into(), Some("1".into()))
        .unwrap();
    assert!(controller.start(exec, "b".into(), Some("1".into())).is_none());

    let outcome = first.await;
    let captured = server.await.unwrap();
    assert_eq!(captured.body["code"], "a");
    assert!(controller.finish(outcome.ticket));
    assert_eq!(outcome.result.unwrap().output, "ok");
    assert!(!controller.is_running());
}
