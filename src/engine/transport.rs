use crate::model::{SelectedFile, SubmitConfig, FILE_FIELD};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;

/// Status and body of a completed HTTP exchange, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Sends a file to the processing service. Deadlines are enforced by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_file(&self, file: &SelectedFile) -> Result<RawResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    endpoint: reqwest::Url,
}

impl ReqwestTransport {
    pub fn new(cfg: &SubmitConfig) -> Result<Self, TransportError> {
        let endpoint = cfg.endpoint();
        let endpoint =
            reqwest::Url::parse(&endpoint).map_err(|e| TransportError::InvalidUrl(format!("{endpoint}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_file(&self, file: &SelectedFile) -> Result<RawResponse, TransportError> {
        // reqwest sets the multipart Content-Type with its boundary; never override it.
        let part = Part::stream(file.content.clone()).file_name(file.name.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        tracing::debug!(%status, bytes = body.len(), "response received");
        Ok(RawResponse { status, body })
    }
}
