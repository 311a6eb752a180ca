//! Fetch tests against a mock render endpoint.
//!
//! The mock accepts a single connection, records the request head, and
//! answers with a canned response.

use std::net::SocketAddr;
use std::time::Duration;

use graphite_render::{
    CLIENT_USER_AGENT, DecodeError, MetricRequest, RenderClient, RenderError, Transport,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers - Mock Render Server
// ============================================================================

/// A canned HTTP response.
struct Reply {
    status: u16,
    reason: &'static str,
    body: String,
}

impl Reply {
    fn ok(body: &str) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body: body.to_string(),
        }
    }

    fn status(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            body: body.to_string(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {} {}\r\nConnection: close\r\n", self.status, self.reason);
        if self.status != 204 {
            out.push_str("Content-Type: application/json\r\n");
            out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        out.push_str("\r\n");
        if self.status != 204 {
            out.push_str(&self.body);
        }
        out.into_bytes()
    }
}

/// A mock render server bound to an ephemeral port.
struct MockRender {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockRender {
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        Self { listener, addr }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Serves one request with `reply`; the receiver yields the request head.
    fn serve_once(self, reply: Reply) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let head = read_head(&mut stream).await;
            stream.write_all(&reply.to_bytes()).await.unwrap();
            stream.flush().await.unwrap();
            let _ = tx.send(head);
        });
        rx
    }

    /// Serves `count` connections concurrently, choosing each reply from the
    /// request head; the receiver yields every head once all are answered.
    fn serve_each(
        self,
        count: usize,
        reply: fn(&str) -> Reply,
    ) -> oneshot::Receiver<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut handlers = Vec::with_capacity(count);
            for _ in 0..count {
                let (mut stream, _) = self.listener.accept().await.unwrap();
                handlers.push(tokio::spawn(async move {
                    let head = read_head(&mut stream).await;
                    stream.write_all(&reply(&head).to_bytes()).await.unwrap();
                    stream.flush().await.unwrap();
                    head
                }));
            }
            let mut heads = Vec::with_capacity(count);
            for handler in handlers {
                heads.push(handler.await.unwrap());
            }
            let _ = tx.send(heads);
        });
        rx
    }

    /// Accepts one request and never answers it.
    fn stall(self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let head = read_head(&mut stream).await;
            let _ = tx.send(head);
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(stream);
        });
        rx
    }
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

const BODY: &str = r#"[
    {"target": "servers.web1.load", "datapoints": [[1.5, 1609459200], [null, 1609459260], [2.0, 1609459320]]},
    {"target": "servers.web2.load", "datapoints": [[0.25, 1609459200]]}
]"#;

// ============================================================================
// Successful fetches
// ============================================================================

#[tokio::test]
async fn fetch_decodes_series() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let _head = server.serve_once(Reply::ok(BODY));

    let request = MetricRequest::new()
        .from("-5min")
        .target("servers.web1.load")
        .target("servers.web2.load");
    let metrics = client.fetch(&CancellationToken::new(), &request).await.unwrap();

    assert_eq!(metrics.len(), 2);
    let web1 = metrics.find("servers.web1.load").unwrap();
    assert_eq!(web1.datapoints.len(), 3);
    assert_eq!(web1.datapoints[0].value, Some(1.5));
    assert_eq!(web1.datapoints[0].timestamp.timestamp(), 1_609_459_200);
    assert_eq!(web1.datapoints[1].value, None);
    assert_eq!(web1.last_value(), Some(2.0));
    assert_eq!(metrics[1].target, "servers.web2.load");
}

#[tokio::test]
async fn fetch_sends_encoded_query_and_headers() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/graphite/render")).unwrap();
    let head = server.serve_once(Reply::ok("[]"));

    let request = MetricRequest::new()
        .from("-1year")
        .targets(["One", "", "Two"]);
    let metrics = client.fetch(&CancellationToken::new(), &request).await.unwrap();
    assert!(metrics.is_empty());

    let head = head.await.unwrap();
    let request_line = head.lines().next().unwrap();
    assert_eq!(
        request_line,
        "GET /graphite/render?format=json&from=-1year&target=One&target=Two HTTP/1.1"
    );
    assert_eq!(header(&head, "accept"), Some("application/json"));
    assert_eq!(header(&head, "user-agent"), Some(CLIENT_USER_AGENT));
}

#[tokio::test]
async fn fetch_no_content_returns_empty() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let _head = server.serve_once(Reply::status(204, "No Content", ""));

    let metrics = client
        .fetch_target(&CancellationToken::new(), "missing.series")
        .await
        .unwrap();
    assert!(metrics.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn fetch_server_error_returns_status() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let _head = server.serve_once(Reply::status(500, "Internal Server Error", "render failed"));

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new().target("a"))
        .await
        .unwrap_err();

    match err {
        RenderError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "render failed");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fetch_error_body_is_truncated() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let long = "x".repeat(4096);
    let _head = server.serve_once(Reply::status(400, "Bad Request", &long));

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    match err {
        RenderError::UnexpectedStatus { body, .. } => assert_eq!(body.len(), 512),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fetch_malformed_body_is_decode_error() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let _head = server.serve_once(Reply::ok("<html>not json</html>"));

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new().target("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Decode(DecodeError::Json(_))));
}

#[tokio::test]
async fn fetch_malformed_point_is_decode_error() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let _head = server.serve_once(Reply::ok(r#"[{"target": "a", "datapoints": [[1.0]]}]"#));

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new().target("a"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::Decode(DecodeError::MalformedDataPoint { index: 0, .. })
    ));
}

#[tokio::test]
async fn fetch_connection_refused_is_transport_error() {
    // Bind then drop to obtain a port with nothing listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = RenderClient::new(Transport::Default, &format!("http://{addr}/render")).unwrap();

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Transport(_)));
}

// ============================================================================
// Cancellation and timeouts
// ============================================================================

#[tokio::test]
async fn fetch_cancelled_before_start_makes_no_request() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let listener = server.listener;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client
        .fetch(&cancel, &MetricRequest::new().target("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Cancelled));

    let accepted = timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "no connection expected");
}

#[tokio::test]
async fn fetch_cancelled_in_flight_returns_promptly() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let head = server.stall();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        // Cancel only once the server holds the request.
        let _ = head.await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .fetch(&cancel, &MetricRequest::new().target("a"))
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn fetch_transport_timeout_is_timed_out() {
    let server = MockRender::new().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = RenderClient::new(Transport::Custom(http), &server.url("/render")).unwrap();
    let _head = server.stall();

    let err = client
        .fetch(&CancellationToken::new(), &MetricRequest::new().target("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::TimedOut));
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn client_is_shared_across_tasks() {
    let server = MockRender::new().await;
    let client = RenderClient::new(Transport::Default, &server.url("/render")).unwrap();
    let base = client.render_url().clone();
    let heads = server.serve_each(2, |head| {
        if head.contains("target=nothing") {
            Reply::ok("[]")
        } else {
            Reply::ok(BODY)
        }
    });

    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        tokio::spawn({
            let client = client.clone();
            let cancel = cancel.clone();
            async move { client.fetch_target(&cancel, "servers.*.load").await }
        }),
        tokio::spawn({
            let client = client.clone();
            let cancel = cancel.clone();
            async move {
                client
                    .fetch(&cancel, &MetricRequest::new().from("-1h").target("nothing"))
                    .await
            }
        }),
    );

    let loads = a.unwrap().unwrap();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].target, "servers.web1.load");
    assert_eq!(loads[1].datapoints[0].value, Some(0.25));
    assert!(b.unwrap().unwrap().is_empty());

    let mut request_lines: Vec<String> = heads
        .await
        .unwrap()
        .iter()
        .filter_map(|head| head.lines().next().map(str::to_string))
        .collect();
    request_lines.sort();
    assert_eq!(
        request_lines,
        vec![
            "GET /render?format=json&from=-1h&target=nothing HTTP/1.1",
            "GET /render?format=json&target=servers.*.load HTTP/1.1",
        ]
    );
    assert_eq!(client.render_url(), &base);
    assert_eq!(client.render_url().query(), None);
}
