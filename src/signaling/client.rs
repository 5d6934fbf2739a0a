//! Remote description client.
//!
//! Sends one JSON POST to the bridge's signaling endpoint and reads back the
//! remote answer. Failures never escape `exchange`: they are logged, passed to
//! the optional notifier, and reported as `None`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use url::Url;

use super::{ConnectionParameters, SignalingError};
use crate::config::{SessionConfig, SignalingFieldNames};
use crate::event_log::EventLog;
use crate::peer::SessionDescription;

/// Called with a user-facing notice whenever an exchange fails
pub type FailureNotifier = Arc<dyn Fn(&str) + Send + Sync>;

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Single-shot offer/answer exchange with the signaling endpoint
#[derive(Clone)]
pub struct RemoteDescriptionClient {
    endpoint: Url,
    fields: SignalingFieldNames,
    timeout: Option<Duration>,
    log: EventLog,
    notifier: Option<FailureNotifier>,
    http: HttpClient,
}

impl fmt::Debug for RemoteDescriptionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDescriptionClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteDescriptionClient {
    /// Build a client for `signaling_url` + `signaling_path`.
    pub fn new(config: &SessionConfig, log: EventLog) -> Result<Self, SignalingError> {
        let endpoint = Url::parse(&config.signaling_url)
            .and_then(|base| base.join(&config.signaling_path))
            .map_err(|e| SignalingError::InvalidEndpoint(format!("{}: {}", config.signaling_url, e)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SignalingError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                endpoint.scheme()
            )));
        }

        // webpki roots for TLS; plain http is allowed for a local bridge
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            endpoint,
            fields: config.signaling_fields.clone(),
            timeout: config.exchange_timeout,
            log,
            notifier: None,
            http: Client::builder(TokioExecutor::new()).build(https),
        })
    }

    pub fn with_failure_notifier(mut self, notifier: FailureNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exchange the local offer for the remote answer.
    ///
    /// `None` means the exchange failed; the reason is already in the log.
    pub async fn exchange(&self, params: &ConnectionParameters) -> Option<SessionDescription> {
        let request = &params.request;
        self.log.info(format!(
            "requesting remote description for {}:{} stream {}",
            request.host, request.port, request.stream_id
        ));

        match self.try_exchange(params).await {
            Ok(answer) => {
                self.log.info(format!(
                    "receiving remote description: {} ({} bytes of sdp)",
                    answer.kind,
                    answer.sdp.len()
                ));
                Some(answer)
            }
            Err(e) => {
                self.log.error(format!("remote description exchange failed: {}", e));
                if let Some(notify) = &self.notifier {
                    notify(&e.notice());
                }
                None
            }
        }
    }

    /// Same as `exchange`, without logging, for callers that want the cause
    pub async fn try_exchange(&self, params: &ConnectionParameters) -> Result<SessionDescription, SignalingError> {
        let body = params.to_body(&self.fields);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.post_offer(&body))
                .await
                .map_err(|_| SignalingError::Timeout(limit))?,
            None => self.post_offer(&body).await,
        }
    }

    /// POST the request body and parse the answer
    async fn post_offer(&self, body: &Value) -> Result<SessionDescription, SignalingError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header("Accept", "application/json, text/plain, */*")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .map_err(|e| SignalingError::Request(e.to_string()))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| SignalingError::Transport(e.to_string()))?;

        let status = response.status();

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SignalingError::Transport(format!("failed to read response body: {}", e)))?
            .to_bytes();

        if status != StatusCode::OK {
            return Err(SignalingError::Rejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body_bytes).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&body_bytes)?)
    }
}
