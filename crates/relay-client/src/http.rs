//! HTTP transport feeding response bytes into a [`ChatPage`]

use crate::dom::Dom;
use crate::page::ChatPage;
use anyhow::{Result, anyhow, bail};
use futures_util::StreamExt;
use reqwest::{StatusCode, header};
use tracing::{debug, warn};

/// Sends chat messages to a relay server
#[derive(Debug, Clone)]
pub struct HttpStreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `message` to the streaming endpoint and apply frames to `page`
    /// as the body arrives. Returns the number of frames applied.
    pub async fn stream_message<D: Dom>(
        &self,
        page: &mut ChatPage<D>,
        target: &str,
        message: &str,
    ) -> Result<usize> {
        self.deliver("/brain/stream", page, target, message).await
    }

    /// Send `message` to the non-streaming endpoint; the answer is applied
    /// once the whole body has arrived.
    pub async fn chat_message<D: Dom>(
        &self,
        page: &mut ChatPage<D>,
        target: &str,
        message: &str,
    ) -> Result<usize> {
        self.deliver("/brain/chat", page, target, message).await
    }

    async fn deliver<D: Dom>(
        &self,
        path: &str,
        page: &mut ChatPage<D>,
        target: &str,
        message: &str,
    ) -> Result<usize> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .form(&[("message", message), ("target", target)])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {}", e))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            bail!("Server rejected the message as empty");
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Server answered {}: {}", status, body.trim());
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let mut handle = page.open(target, content_type.as_deref());

        let mut body = response.bytes_stream();
        let mut interrupted = None;
        while let Some(piece) = body.next().await {
            match piece {
                Ok(bytes) => {
                    page.receive(&mut handle, &bytes)?;
                }
                Err(e) => {
                    warn!("Response body interrupted after {} bytes: {}", handle.bytes_received(), e);
                    interrupted = Some(e);
                    break;
                }
            }
        }

        let frames = page.close(handle)?;
        if let Some(e) = interrupted {
            return Err(anyhow::Error::new(e).context("Response body interrupted"));
        }
        Ok(frames)
    }
}
