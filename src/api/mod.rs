pub mod client;
pub mod models;

pub use client::{ApiClient, Result, SummaryStream};
pub use models::{ApiConfig, ProgressStatus, UploadResponse};
