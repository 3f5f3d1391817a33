use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, info, warn};

use super::stream::DocumentTree;
use super::{DocumentSource, Subscription};
use crate::error::{Result, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// The server sends keep-alive events every 30 seconds
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Firebase Realtime Database over its REST interface.
///
/// Reads are plain `GET {path}.json` requests; subscriptions hold an
/// event-stream response open and rebuild the document from its events.
#[derive(Debug, Clone)]
pub struct RealtimeDb {
    http: reqwest::Client,
    base: Url,
    auth: Option<String>,
    reconnect_delay: Duration,
}

impl RealtimeDb {
    pub fn new(database_url: &str, auth: Option<String>) -> Result<Self> {
        let base = parse_database_url(database_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("live-standings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            auth: auth.filter(|a| !a.is_empty()),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn database_url(&self) -> &str {
        self.base.as_str()
    }

    /// REST URL of a store path
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}.json", base_path, path.trim_matches('/')));
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        url
    }

    async fn get_once(&self, path: &str) -> Result<Option<Value>> {
        let response = self
            .http
            .get(self.url_for(path))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, path)?;
        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    /// Hold one event stream open until it ends, forwarding each new
    /// document. Returns Ok when the server closed the stream normally or
    /// the receiver went away.
    async fn stream_once(
        &self,
        path: &str,
        tx: &mpsc::UnboundedSender<Result<Option<Value>>>,
    ) -> Result<()> {
        let response = self
            .http
            .get(self.url_for(path))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check_status(response, path)?;
        debug!(path, "Stream opened");

        let mut events = response.bytes_stream().eventsource();
        let mut tree = DocumentTree::default();

        loop {
            let event = match tokio::time::timeout(STREAM_IDLE_TIMEOUT, events.next()).await {
                Ok(Some(event)) => event?,
                Ok(None) => return Ok(()),
                Err(_) => {
                    return Err(StoreError::Http(format!(
                        "No data on stream for {} in {}s",
                        path,
                        STREAM_IDLE_TIMEOUT.as_secs()
                    )))
                }
            };

            if let Some(snapshot) = tree.apply(&event, path)? {
                if tx.send(Ok(snapshot)).is_err() {
                    return Ok(());
                }
            }
        }
    }

    /// Keep a subscription alive across dropped connections
    async fn follow(self, path: String, tx: mpsc::UnboundedSender<Result<Option<Value>>>) {
        loop {
            match self.stream_once(&path, &tx).await {
                Ok(()) => debug!(path = %path, "Stream ended"),
                Err(e) if ends_subscription(&e) => {
                    warn!(path = %path, error = %e, "Subscription closed");
                    let _ = tx.send(Err(e));
                    return;
                }
                Err(e) => warn!(path = %path, error = %e, "Stream failed"),
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
            info!(path = %path, "Reconnecting stream");
        }
    }
}

impl DocumentSource for RealtimeDb {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        // Retry strategy: exponential backoff with 3 attempts
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        RetryIf::spawn(
            retry_strategy,
            || self.get_once(path),
            StoreError::is_transient,
        )
        .await
    }

    fn subscribe(&self, path: &str) -> Subscription {
        let db = self.clone();
        let owned = path.to_string();
        Subscription::spawn(path, move |tx| db.follow(owned, tx))
    }
}

fn parse_database_url(database_url: &str) -> Result<Url> {
    let url = Url::parse(database_url.trim()).map_err(|e| StoreError::InvalidUrl {
        url: database_url.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(StoreError::InvalidUrl {
            url: database_url.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(status_error(status, path))
}

fn status_error(status: StatusCode, path: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::PermissionDenied(path.to_string())
        }
        _ => StoreError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        },
    }
}

/// Errors that reconnecting cannot fix
fn ends_subscription(error: &StoreError) -> bool {
    match error {
        StoreError::StreamClosed { .. } | StoreError::PermissionDenied(_) => true,
        StoreError::Status { status, .. } => !error.is_transient() && *status < 500,
        _ => false,
    }
}
