//! Mock letter service for testing
//!
//! A small HTTP server on a random local port that speaks the same JSON as
//! the real letter service:
//! - POST /api/time-letters returns { letter_id, status, created_at }
//! - GET /api/time-letters/history?email=... returns { letters: [...] }
//! - GET /api/time-letters/{id} returns the full record
//! - GET /health returns { status: "healthy" }
//!
//! Failure modes are switched on through [`MockConfig`].

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{title_for, LetterStatus};

/// Mock letter service
pub struct MockLetterServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// How the mock should misbehave
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Reply with this status and an empty body
    Status(u16),
    /// Reply with this status and `{"message": ...}`
    Message(u16, String),
    /// Reply with this status and `{"detail": ...}` (FastAPI style)
    Detail(u16, String),
    /// Reply 200 with a body that is not JSON
    MalformedBody,
}

/// Configuration for the mock server
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub failure: Option<MockFailure>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Serialize)]
struct StoredLetter {
    id: String,
    content: String,
    delivery_email: String,
    delivery_time: String,
    status: LetterStatus,
    sent_at: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Default)]
struct MockState {
    config: MockConfig,
    letters: Vec<StoredLetter>,
    requests: Vec<RecordedRequest>,
}

#[derive(Deserialize)]
struct CreateBody {
    content: String,
    delivery_email: String,
    delivery_time: String,
}

impl MockLetterServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let state = Arc::new(Mutex::new(MockState {
            config,
            ..Default::default()
        }));
        let state_clone = state.clone();

        // Non-blocking accept so stop() can end the loop
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Seed a letter; returns its id
    pub fn add_letter(&self, email: &str, content: &str, status: LetterStatus) -> String {
        let now = Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        let letter = StoredLetter {
            id: id.clone(),
            content: content.to_string(),
            delivery_email: email.to_string(),
            delivery_time: now.clone(),
            status,
            sent_at: (status == LetterStatus::Sent).then(|| now.clone()),
            error_message: (status == LetterStatus::Failed).then(|| "SMTP rejected".to_string()),
            created_at: now.clone(),
            updated_at: now,
        };
        self.state.lock().unwrap().letters.push(letter);
        id
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockLetterServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    // Headers first
    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body_end = data.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&data[header_end..body_end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn handle_connection(mut stream: TcpStream, state: &Arc<Mutex<MockState>>) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        return;
    };

    let config = {
        let mut guard = state.lock().unwrap();
        guard.requests.push(request.clone());
        guard.config.clone()
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    match &config.failure {
        Some(MockFailure::Status(code)) => {
            send_response(&mut stream, *code, "");
            return;
        }
        Some(MockFailure::Message(code, message)) => {
            let body = serde_json::json!({ "message": message }).to_string();
            send_response(&mut stream, *code, &body);
            return;
        }
        Some(MockFailure::Detail(code, detail)) => {
            let body = serde_json::json!({ "detail": detail }).to_string();
            send_response(&mut stream, *code, &body);
            return;
        }
        Some(MockFailure::MalformedBody) => {
            send_response(&mut stream, 200, "this is not json");
            return;
        }
        None => {}
    }

    let (path, query) = match request.path.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (request.path.clone(), String::new()),
    };

    match (request.method.as_str(), path.as_str()) {
        ("GET", "/health") => send_response(&mut stream, 200, r#"{"status": "healthy"}"#),
        ("POST", "/api/time-letters") => create_letter(&mut stream, state, &request.body),
        ("GET", "/api/time-letters/history") => {
            let email = url::form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == "email")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            history(&mut stream, state, &email);
        }
        ("GET", p) if p.starts_with("/api/time-letters/") => {
            let id = p.trim_start_matches("/api/time-letters/");
            let guard = state.lock().unwrap();
            match guard.letters.iter().find(|l| l.id == id) {
                Some(letter) => {
                    let body = serde_json::to_string(letter).unwrap();
                    drop(guard);
                    send_response(&mut stream, 200, &body);
                }
                None => {
                    drop(guard);
                    send_response(&mut stream, 404, r#"{"detail": "Letter not found"}"#);
                }
            }
        }
        _ => send_response(&mut stream, 404, r#"{"detail": "Not Found"}"#),
    }
}

fn create_letter(stream: &mut TcpStream, state: &Arc<Mutex<MockState>>, body: &str) {
    let Ok(parsed) = serde_json::from_str::<CreateBody>(body) else {
        send_response(stream, 422, r#"{"detail": [{"msg": "invalid body"}]}"#);
        return;
    };

    // Same rules the real service enforces
    if parsed.content.trim().chars().count() < 10 {
        send_response(stream, 400, r#"{"detail": "Content must be at least 10 characters"}"#);
        return;
    }
    let Ok(delivery) = DateTime::parse_from_rfc3339(&parsed.delivery_time) else {
        send_response(stream, 422, r#"{"detail": [{"msg": "invalid datetime"}]}"#);
        return;
    };
    if delivery.with_timezone(&Utc) <= Utc::now() {
        send_response(stream, 400, r#"{"detail": "Delivery time must be in the future"}"#);
        return;
    }

    let now = Utc::now().to_rfc3339();
    let letter = StoredLetter {
        id: Uuid::new_v4().to_string(),
        content: parsed.content.trim().to_string(),
        delivery_email: parsed.delivery_email,
        delivery_time: parsed.delivery_time,
        status: LetterStatus::Scheduled,
        sent_at: None,
        error_message: None,
        created_at: now.clone(),
        updated_at: now.clone(),
    };
    let response = serde_json::json!({
        "letter_id": letter.id,
        "status": "scheduled",
        "created_at": now,
    });
    state.lock().unwrap().letters.push(letter);
    send_response(stream, 201, &response.to_string());
}

fn history(stream: &mut TcpStream, state: &Arc<Mutex<MockState>>, email: &str) {
    let rows: Vec<serde_json::Value> = state
        .lock()
        .unwrap()
        .letters
        .iter()
        .rev()
        .filter(|l| l.delivery_email == email)
        .map(|l| {
            serde_json::json!({
                "id": l.id,
                "title": title_for(&l.content),
                "delivery_time": l.delivery_time,
                "status": l.status,
                "created_at": l.created_at,
            })
        })
        .collect();
    let body = serde_json::json!({ "letters": rows }).to_string();
    send_response(stream, 200, &body);
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{HttpLetterGateway, NETWORK_FAILURE};
    use crate::domain::result::Error;
    use crate::domain::CreateLetterRequest;
    use crate::ports::LetterGateway;

    fn gateway_for(server: &MockLetterServer) -> HttpLetterGateway {
        HttpLetterGateway::new(&server.base_url()).unwrap()
    }

    fn request_in(minutes: i64) -> CreateLetterRequest {
        CreateLetterRequest {
            content: "Hello future me".to_string(),
            delivery_email: "user@example.com".to_string(),
            delivery_time: (Utc::now() + chrono::Duration::minutes(minutes)).to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let health = gateway_for(&server).health_check().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_create_letter_sends_json_and_iso_time() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let gateway = gateway_for(&server);

        let request = request_in(10);
        let response = gateway.create_letter(&request).await.unwrap();
        assert_eq!(response.status, LetterStatus::Scheduled);
        assert!(!response.letter_id.is_empty());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.method, "POST");
        assert_eq!(sent.path, "/api/time-letters");
        assert_eq!(sent.header("content-type"), Some("application/json"));

        let body = sent.json();
        assert_eq!(body["content"], "Hello future me");
        let time = body["delivery_time"].as_str().unwrap();
        assert!(time.ends_with('Z'), "expected UTC timestamp, got {}", time);
        assert_eq!(time.len(), "2026-01-01T00:00:00.000Z".len());
    }

    #[tokio::test]
    async fn test_create_letter_rejects_unparseable_time_before_sending() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let mut request = request_in(10);
        request.delivery_time = "next tuesday".to_string();

        let err = gateway_for(&server).create_letter(&request).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        server.add_letter("a+b@example.com", "first letter body", LetterStatus::Sent);
        server.add_letter("other@example.com", "not mine at all", LetterStatus::Scheduled);

        let history = gateway_for(&server).get_history("a+b@example.com").await.unwrap();
        assert_eq!(history.letters.len(), 1);
        assert_eq!(history.letters[0].status, LetterStatus::Sent);
        assert_eq!(history.letters[0].title, "first letter body");
    }

    #[tokio::test]
    async fn test_history_empty_is_not_an_error() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let history = gateway_for(&server).get_history("nobody@example.com").await.unwrap();
        assert!(history.letters.is_empty());
    }

    #[tokio::test]
    async fn test_get_letter_and_not_found() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let id = server.add_letter("me@example.com", "a failed letter", LetterStatus::Failed);
        let gateway = gateway_for(&server);

        let detail = gateway.get_letter(&id).await.unwrap();
        assert_eq!(detail.status, LetterStatus::Failed);
        assert_eq!(detail.error_message.as_deref(), Some("SMTP rejected"));

        let err = gateway.get_letter("missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Letter not found");
    }

    #[tokio::test]
    async fn test_server_message_surfaces_verbatim() {
        let server = MockLetterServer::start(MockConfig {
            failure: Some(MockFailure::Message(400, "Daily letter limit reached".to_string())),
            ..Default::default()
        })
        .unwrap();

        let err = gateway_for(&server).create_letter(&request_in(10)).await.unwrap_err();
        assert_eq!(err.to_string(), "Daily letter limit reached");
    }

    #[tokio::test]
    async fn test_status_only_error_is_generic() {
        let server = MockLetterServer::start(MockConfig {
            failure: Some(MockFailure::Status(503)),
            ..Default::default()
        })
        .unwrap();

        let err = gateway_for(&server).get_history("me@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[tokio::test]
    async fn test_fastapi_detail_surfaces() {
        let server = MockLetterServer::start(MockConfig {
            failure: Some(MockFailure::Detail(500, "Failed to query history".to_string())),
            ..Default::default()
        })
        .unwrap();

        let err = gateway_for(&server).get_history("me@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to query history");
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockLetterServer::start(MockConfig {
            failure: Some(MockFailure::MalformedBody),
            ..Default::default()
        })
        .unwrap();

        let err = gateway_for(&server).health_check().await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let mut server = MockLetterServer::start(MockConfig::default()).unwrap();
        let base_url = server.base_url();
        server.stop();
        drop(server);

        let gateway = HttpLetterGateway::new(&base_url).unwrap();
        let err = gateway.health_check().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.to_string().starts_with(NETWORK_FAILURE));
    }

    #[tokio::test]
    async fn test_extra_headers_are_merged() {
        let server = MockLetterServer::start(MockConfig::default()).unwrap();
        let gateway = gateway_for(&server).with_header("X-Client", "tlm-test").unwrap();
        gateway.health_check().await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].header("x-client"), Some("tlm-test"));
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_slow_service_hits_configured_timeout() {
        let server = MockLetterServer::start(MockConfig {
            delay_ms: 1_000,
            ..Default::default()
        })
        .unwrap();
        let gateway =
            HttpLetterGateway::with_timeout(&server.base_url(), Some(std::time::Duration::from_millis(100)))
                .unwrap();

        let err = gateway.health_check().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.to_string().starts_with(NETWORK_FAILURE));
        assert!(err.to_string().contains("timed out"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_slow_service_without_timeout_still_answers() {
        let server = MockLetterServer::start(MockConfig {
            delay_ms: 200,
            ..Default::default()
        })
        .unwrap();

        let health = gateway_for(&server).health_check().await.unwrap();
        assert_eq!(health.status, "healthy");
    }
}
