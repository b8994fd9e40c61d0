//! Analysis Stream Transport
//!
//! Opens the streaming analysis request and exposes the response body as a
//! pull-based sequence of byte chunks.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Pull-based source of response body chunks.
#[async_trait]
pub trait ChunkSource: Send {
    /// Next chunk of the body, or `None` once the stream has ended.
    async fn next_chunk(&mut self) -> ClientResult<Option<Bytes>>;

    /// Stop reading and release the connection. Safe to call repeatedly;
    /// afterwards `next_chunk` yields `None`.
    fn cancel(&mut self);
}

/// Chunk source backed by a live HTTP response.
#[derive(Debug)]
pub struct HttpChunkSource {
    response: Option<reqwest::Response>,
}

impl HttpChunkSource {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
        }
    }

    pub fn is_open(&self) -> bool {
        self.response.is_some()
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> ClientResult<Option<Bytes>> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };
        match response.chunk().await {
            Ok(Some(chunk)) => Ok(Some(chunk)),
            Ok(None) => {
                self.response = None;
                Ok(None)
            }
            Err(e) => {
                self.response = None;
                Err(ClientError::network(format!("stream interrupted: {}", e)))
            }
        }
    }

    fn cancel(&mut self) {
        if self.response.take().is_some() {
            debug!("Closed analysis stream connection");
        }
    }
}

/// POST `body` to `url` and return the open event stream.
///
/// A non-2xx status fails here, before any chunk is read.
pub async fn open_event_stream<B>(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
    body: &B,
) -> ClientResult<HttpChunkSource>
where
    B: Serialize + ?Sized,
{
    let mut request = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "text/event-stream")
        .json(body);
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ClientError::network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ClientError::from_status(status.as_u16(), &text));
    }

    debug!(url = %url, status = status.as_u16(), "Opened analysis stream");
    Ok(HttpChunkSource::new(response))
}
