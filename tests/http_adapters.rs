// tests/http_adapters.rs
//
// HttpSource and OneSignalDispatcher against a one-shot local HTTP stub.
//
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use carnabot_poller::compose::NotificationMessage;
use carnabot_poller::config::{PushOptions, SourceOptions};
use carnabot_poller::dispatch::{Delivery, Dispatcher, OneSignalDispatcher};
use carnabot_poller::error::{DispatchError, FetchError};
use carnabot_poller::fetch::{fetch_snapshot, HttpSource, Source};
use carnabot_poller::{Entry, RunError};
use reqwest::blocking::Client;

struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Serve exactly one request with `status` and `body`; hand back what was received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() { break; }
            if let Some((k, v)) = line.split_once(':') {
                headers.push((k.trim().to_string(), v.trim().to_string()));
            }
        }

        let len: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).unwrap();

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ).unwrap();
        stream.flush().unwrap();

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(buf).unwrap(),
        }
    });

    (url, handle)
}

fn client() -> Client {
    Client::builder().no_proxy().timeout(Duration::from_secs(10)).build().unwrap()
}

fn push_opts(api_url: String) -> PushOptions {
    PushOptions {
        api_url,
        app_id: "app-42".into(),
        rest_key: "rest-secret".into(),
        ..PushOptions::default()
    }
}

fn message() -> NotificationMessage {
    NotificationMessage {
        entity: "BlocoX".into(),
        title: "Carnabot Avisa! 🥁".into(),
        body: "📍 O bloco \"BlocoX\" mudou de lugar! Novo local: Praça B.".into(),
    }
}

#[test]
fn source_downloads_and_parses_sheet() {
    let (base, server) = serve_once("200 OK", "bloco,local,hora\r\n\"Bloco, Um\",Praça A,14h\r\n");
    let url = format!("{base}/export?format=csv");
    let src = HttpSource::with_client(client(), &url);

    let snap = fetch_snapshot(&src, &SourceOptions { url: url.clone(), ..SourceOptions::default() }).unwrap();

    assert_eq!(snap.get("Bloco, Um"), Some(&Entry::new("Praça A", "14h")));
    let req = server.join().unwrap();
    assert_eq!(req.request_line, "GET /export?format=csv HTTP/1.1");
    assert_eq!(src.locator(), url);
}

#[test]
fn source_maps_http_errors() {
    let (base, server) = serve_once("404 Not Found", "nope");
    let src = HttpSource::with_client(client(), &base);

    let err = src.fetch().unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    server.join().unwrap();
}

#[test]
fn source_unreachable_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let src = HttpSource::with_client(client(), &format!("http://127.0.0.1:{port}/"));

    let err = fetch_snapshot(&src, &SourceOptions::default()).unwrap_err();

    assert!(matches!(err, RunError::Fetch(FetchError::Transport { .. })));
}

#[test]
fn dispatcher_posts_authenticated_broadcast() {
    let (base, server) = serve_once("200 OK", r#"{"id":"n-1","recipients":10}"#);
    let push = OneSignalDispatcher::with_client(client(), push_opts(format!("{base}/api/v1/notifications")));

    let delivery = push.dispatch(&message()).unwrap();

    assert_eq!(delivery, Delivery::Sent);
    let req = server.join().unwrap();
    assert_eq!(req.request_line, "POST /api/v1/notifications HTTP/1.1");
    assert_eq!(req.header("authorization"), Some("Basic rest-secret"));
    assert!(req.header("content-type").unwrap_or("").starts_with("application/json"));

    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["app_id"], "app-42");
    assert_eq!(body["included_segments"], serde_json::json!(["Total Subscriptions"]));
    assert_eq!(body["contents"]["pt"], message().body);
    assert_eq!(body["contents"]["en"], message().body);
    assert_eq!(body["headings"]["pt"], "Carnabot Avisa! 🥁");
}

#[test]
fn dispatcher_reports_rejection() {
    let (base, server) = serve_once("400 Bad Request", r#"{"errors":["Invalid app_id"]}"#);
    let push = OneSignalDispatcher::with_client(client(), push_opts(base));

    let err = push.dispatch(&message()).unwrap_err();

    match err {
        DispatchError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid app_id"));
        }
        other => panic!("unexpected: {other}"),
    }
    server.join().unwrap();
}
