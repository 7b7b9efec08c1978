use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::domain::FileMeta;
use crate::utils::filename_from_content_disposition;

use super::models::{
    ApiConfig, ProgressStatus, StartSummaryResponse, UploadResponse, CHECK_PROGRESS_PATH,
    DOWNLOAD_SUMMARY_PATH, GET_SUMMARY_PATH, START_SUMMARY_PATH, UPLOAD_FIELD, UPLOAD_PATH,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Streaming body of /download_summary and its announced length.
pub struct SummaryStream {
    pub total: Option<u64>,
    pub bytes: BoxStream<'static, Result<Bytes>>,
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.config.base_url)?;
        // Url::join drops the last segment unless the base ends with a slash
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path)?)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Upload one file as multipart field `file`.
    ///
    /// Every chunk handed to the transport reports `(bytes_sent, bytes_total)` on `progress`.
    /// The sender is dropped once the request body is gone.
    pub async fn upload_file(
        &self,
        file: &FileMeta,
        progress: UnboundedSender<(u64, u64)>,
    ) -> Result<UploadResponse> {
        let handle = tokio::fs::File::open(&file.path).await?;
        let total = handle.metadata().await?.len();

        let mut sent = 0u64;
        let body = ReaderStream::new(handle).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            let _ = progress.send((sent, total));
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        // The server's acknowledgment body is informational only
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    /// Ask the server to start summarizing everything uploaded so far.
    pub async fn start_summary(&self) -> Result<StartSummaryResponse> {
        let response = self
            .http
            .post(self.endpoint(START_SUMMARY_PATH)?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    pub async fn check_progress(&self) -> Result<ProgressStatus> {
        let response = self
            .http
            .get(self.endpoint(CHECK_PROGRESS_PATH)?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// Fetch the summary as text for an in-app preview.
    pub async fn get_summary(&self) -> Result<String> {
        let response = self
            .http
            .get(self.endpoint(GET_SUMMARY_PATH)?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Ask for the summary's attachment name without transferring it.
    ///
    /// Fails like the download itself would when no summary exists.
    pub async fn summary_filename(&self) -> Result<Option<String>> {
        let response = self
            .http
            .head(self.endpoint(DOWNLOAD_SUMMARY_PATH)?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition))
    }

    /// Open the summary file as a byte stream
    pub async fn download_summary(&self) -> Result<SummaryStream> {
        let response = self
            .http
            .get(self.endpoint(DOWNLOAD_SUMMARY_PATH)?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let total = response.content_length();
        let bytes = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok(SummaryStream { total, bytes })
    }
}
