//! Server-sent event ingestion.
//!
//! Each dashboard stream endpoint publishes exactly one message type as
//! `data:` lines of JSON. A feed task owns one long-lived connection,
//! reconnecting with [`StreamBackoff`] when it drops, and hands every
//! decoded message to an `apply` callback in transport order. A
//! malformed payload is logged and skipped; whatever was applied last
//! stays in place.
//!
//! Teardown is owned by the consumer via [`FeedHandle`]: once the handle
//! is closed, no further message is applied, including messages already
//! decoded but not yet handed over.

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use jd_domain::{Error, Result};

use crate::reconnect::StreamBackoff;

/// Extract complete `data:` payloads from an SSE buffer.
///
/// Events are delimited by `\n\n`; `event:`, `id:` and `retry:` lines are
/// ignored. Consumed bytes are removed from the buffer; a trailing
/// partial event stays for the next call.
pub(crate) fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = buffer.find("\n\n") {
        let rest = buffer.split_off(pos + 2);
        let block = std::mem::replace(buffer, rest);
        for line in block.lines() {
            if let Some(data) = line.trim_start().strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    payloads.push(data.to_owned());
                }
            }
        }
    }
    payloads
}

/// Teardown handle for a running feed task.
pub struct FeedHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    /// Stop the feed. Idempotent; after this returns no further message
    /// will be applied, though the task may still be winding down.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Close and wait for the task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Spawn a feed task streaming `url` and applying each decoded message.
pub fn spawn_json_feed<T, F>(
    http: &reqwest::Client,
    url: impl Into<String>,
    backoff: StreamBackoff,
    apply: F,
) -> FeedHandle
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_feed(
        http.clone(),
        url.into(),
        backoff,
        cancel.clone(),
        apply,
    ));
    FeedHandle { cancel, task }
}

async fn run_feed<T, F>(
    http: reqwest::Client,
    url: String,
    backoff: StreamBackoff,
    cancel: CancellationToken,
    apply: F,
) where
    T: DeserializeOwned,
    F: Fn(T),
{
    let mut failures: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return;
        }

        match stream_once(&http, &url, &cancel, &apply).await {
            Ok(delivered) => {
                if delivered > 0 {
                    failures = 0;
                }
                tracing::debug!(url = %url, delivered, "event stream ended");
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                tracing::warn!(url = %url, failures, error = %e, "event stream lost");
            }
        }

        if cancel.is_cancelled() {
            return;
        }

        let delay = backoff.delay_for_attempt(failures);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return,
        }
    }
}

/// One connection lifecycle: connect, then apply messages until the
/// stream ends, errors, or the feed is torn down.
async fn stream_once<T, F>(
    http: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
    apply: &F,
) -> Result<u64>
where
    T: DeserializeOwned,
    F: Fn(T),
{
    let response = tokio::select! {
        _ = cancel.cancelled() => return Ok(0),
        r = http.get(url).send() => r.map_err(|e| Error::Http(e.to_string()))?,
    };
    if !response.status().is_success() {
        return Err(Error::Api {
            status: response.status().as_u16(),
            message: "event stream endpoint refused the connection".into(),
        });
    }

    let mut response = response;
    let mut buffer = String::new();
    let mut delivered: u64 = 0;

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return Ok(delivered),
            c = response.chunk() => c,
        };

        match chunk {
            Ok(Some(bytes)) => {
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                delivered += apply_payloads(&mut buffer, url, cancel, apply);
                if cancel.is_cancelled() {
                    return Ok(delivered);
                }
            }
            Ok(None) => {
                // Stream closed cleanly; flush a trailing partial event.
                if !buffer.trim().is_empty() {
                    buffer.push_str("\n\n");
                    delivered += apply_payloads(&mut buffer, url, cancel, apply);
                }
                return Ok(delivered);
            }
            Err(e) => return Err(Error::Stream(e.to_string())),
        }
    }
}

fn apply_payloads<T, F>(
    buffer: &mut String,
    url: &str,
    cancel: &CancellationToken,
    apply: &F,
) -> u64
where
    T: DeserializeOwned,
    F: Fn(T),
{
    let mut delivered = 0;
    for data in drain_data_lines(buffer) {
        match serde_json::from_str::<T>(&data) {
            Ok(value) => {
                // A teardown racing the decode discards the message.
                if cancel.is_cancelled() {
                    return delivered;
                }
                apply(value);
                delivered += 1;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "dropping malformed event payload");
            }
        }
    }
    delivered
}
