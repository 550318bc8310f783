// tests/telegram_http.rs
//
// TelegramNotifier against a local stand-in for the Bot API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use job_scout::notify::{Notifier, TelegramNotifier};

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<AtomicUsize>,
    /// Calls answered with 500 before succeeding.
    fail_first: usize,
    /// Reject everything with 400.
    reject: bool,
    last: Arc<Mutex<Option<Value>>>,
}

async fn send_message(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = stub.calls.fetch_add(1, Ordering::SeqCst);
    *stub.last.lock() = Some(body);
    if stub.reject {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "description": "Bad Request: chat not found"})),
        );
    }
    if n < stub.fail_first {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"ok": false, "description": "Internal Server Error"})),
        );
    }
    (StatusCode::OK, Json(json!({"ok": true, "result": {}})))
}

async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route("/botTESTTOKEN/sendMessage", post(send_message))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn notifier(base: &str) -> TelegramNotifier {
    TelegramNotifier::new("TESTTOKEN".into())
        .with_api_base(base)
        .with_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn sends_html_message_to_chat() {
    let stub = Stub::default();
    let base = serve(stub.clone()).await;

    notifier(&base)
        .deliver("<b>DevOps Engineer</b>", "-100123")
        .await
        .unwrap();

    let body = stub.last.lock().clone().unwrap();
    assert_eq!(body["chat_id"], "-100123");
    assert_eq!(body["text"], "<b>DevOps Engineer</b>");
    assert_eq!(body["parse_mode"], "HTML");
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let stub = Stub {
        fail_first: 2,
        ..Stub::default()
    };
    let base = serve(stub.clone()).await;

    notifier(&base).with_retries(3).deliver("hi", "1").await.unwrap();
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let stub = Stub {
        fail_first: 10,
        ..Stub::default()
    };
    let base = serve(stub.clone()).await;

    let err = notifier(&base).with_retries(2).deliver("hi", "1").await.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_errors_fail_fast_without_leaking_token() {
    let stub = Stub {
        reject: true,
        ..Stub::default()
    };
    let base = serve(stub.clone()).await;

    let err = notifier(&base).deliver("hi", "nope").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("chat not found"), "{msg}");
    assert!(!msg.contains("TESTTOKEN"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_api_is_an_error() {
    // Nothing listens on the discard port.
    let err = notifier("http://127.0.0.1:9")
        .with_retries(1)
        .deliver("hi", "1")
        .await
        .unwrap_err();
    assert!(!err.to_string().contains("TESTTOKEN"));
}
