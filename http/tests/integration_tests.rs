use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gblibx_http::*;
use serde_json::json;

fn client() -> HttpClient {
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    HttpClient::from_client(http)
}

/// Serves one response and returns the base URL plus the raw request.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });
    (format!("http://{addr}"), handle)
}

fn read_request(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        if line.is_empty() || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    let len = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    let mut body = vec![0; len];
    reader.read_exact(&mut body).unwrap();
    format!("{head}\r\n{}", String::from_utf8(body).unwrap())
}

// ---------------------------------------------------------------------------
// GET
// ---------------------------------------------------------------------------

#[test]
fn test_get_sends_encoded_query() {
    let (base, server) = serve_once("200 OK", r#"{"count": 2}"#);
    let map = client()
        .get_key_values(&format!("{base}/jobs.json"), &["state=queued", "owner=a b"])
        .unwrap();
    assert_eq!(map["count"], json!(2));

    let request = server.join().unwrap();
    assert!(
        request.starts_with("GET /jobs.json?state=queued&owner=a+b HTTP/1.1\r\n"),
        "{request}"
    );
}

#[test]
fn test_get_wraps_array_body() {
    let (base, server) = serve_once("201 Created", "[1, 2, 3]");
    let map = client().get(&base, &[]).unwrap();
    assert_eq!(map[DATA_KEY], json!([1, 2, 3]));
    server.join().unwrap();
}

#[test]
fn test_error_status_carries_code() {
    let (base, server) = serve_once("404 Not Found", "no such job");
    let err = client().get(&format!("{base}/jobs/9"), &[]).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "404: Not Found");
    let HttpError::Status { body, .. } = err else {
        panic!("expected status error");
    };
    assert_eq!(body, "no such job");
    server.join().unwrap();
}

#[test]
fn test_bad_parameter_sends_nothing() {
    let err = client()
        .get_key_values("http://127.0.0.1:9/", &["noequals"])
        .unwrap_err();
    assert!(matches!(err, HttpError::Parameter(p) if p == "noequals"));
}

// ---------------------------------------------------------------------------
// POST
// ---------------------------------------------------------------------------

#[test]
fn test_post_json_body() {
    let (base, server) = serve_once("200 OK", r#"{"id": 11}"#);
    let map = client()
        .post_json(&format!("{base}/jobs"), &json!({"name": "build", "prio": 3}))
        .unwrap();
    assert_eq!(map["id"], json!(11));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /jobs HTTP/1.1\r\n"), "{request}");
    assert!(
        request.to_lowercase().contains("content-type: application/json"),
        "{request}"
    );
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(sent, json!({"name": "build", "prio": 3}));
}

#[test]
fn test_post_error_status_is_not_retried() {
    let (base, server) = serve_once("500 Internal Server Error", "");
    let started = Instant::now();
    let err = client()
        .with_post_retry(5, Duration::from_secs(10))
        .post_json(&base, &json!({}))
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(started.elapsed() < Duration::from_secs(5));
    server.join().unwrap();
}

#[test]
fn test_post_gives_up_when_unreachable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let started = Instant::now();
    let err = client()
        .with_post_retry(3, Duration::from_millis(20))
        .post_json(&http_url("127.0.0.1", port, "/jobs"), &json!({"x": 1}))
        .unwrap_err();
    assert!(matches!(err, HttpError::Request { .. }), "{err:?}");
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert!(started.elapsed() < Duration::from_secs(5));
}
