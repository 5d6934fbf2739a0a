//! In-process signaling endpoint for tests.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// What the stub saw for one request
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub(crate) struct SignalingStub {
    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl SignalingStub {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }
}

/// Serve `status` + `body` for every request, after an optional delay
pub(crate) async fn spawn_stub(status: u16, body: &str, delay: Option<Duration>) -> SignalingStub {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let status = StatusCode::from_u16(status).expect("valid status");
    let body = body.to_string();

    let captured = requests.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let io = TokioIo::new(stream);
            let captured = captured.clone();
            let body = body.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let captured = captured.clone();
                    let body = body.clone();
                    async move { respond(req, captured, status, body, delay).await }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    SignalingStub {
        url: format!("http://{}", addr),
        requests,
    }
}

async fn respond(
    req: Request<Incoming>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let accept = header("accept");
    let content_type = header("content-type");

    let request_body = req.collect().await?.to_bytes();
    captured.lock().push(CapturedRequest {
        method,
        path,
        accept,
        content_type,
        body: String::from_utf8_lossy(&request_body).into_owned(),
    });

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    Ok(Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .expect("stub response"))
}

/// JSON answer body as the bridge would send it
pub(crate) fn answer_body(sdp: &str) -> String {
    serde_json::json!({ "type": "answer", "sdp": sdp }).to_string()
}
