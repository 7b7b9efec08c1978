use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const UPLOAD_PATH: &str = "upload";
pub const START_SUMMARY_PATH: &str = "start_summary";
pub const CHECK_PROGRESS_PATH: &str = "check_progress";
pub const GET_SUMMARY_PATH: &str = "get_summary";
pub const DOWNLOAD_SUMMARY_PATH: &str = "download_summary";

/// Multipart field carrying the file payload
pub const UPLOAD_FIELD: &str = "file";

/// Response from the /upload endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response from the /start_summary endpoint, only used for logging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StartSummaryResponse {
    #[serde(default)]
    pub status: String,
}

/// Response from the /check_progress endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressStatus {
    pub done: bool,
    #[serde(default)]
    pub in_progress: bool,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    /// `None` uploads every selected file at once.
    pub max_concurrent_uploads: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            poll_interval: Duration::from_secs(3),
            max_concurrent_uploads: None,
        }
    }
}
