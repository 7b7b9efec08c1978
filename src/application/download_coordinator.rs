use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::{
    api::{ApiClient, SummaryStream},
    domain::AppError,
    utils::percent,
};

const DEFAULT_SUMMARY_FILENAME: &str = "summaries.txt";

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Fraction in `0.0..=1.0`, stays at zero when the size is unknown.
    Progress(f32),
    Completed(PathBuf),
    Cancelled,
    Failed(AppError),
}

/// Saves the finished summary to a location the user picks.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub async fn choose_save_path(suggested_filename: String) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested_filename)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Resolve the name, let the user pick a path, and only then open the transfer.
    pub fn download_stream(&self) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(
            DownloadRuntimeState::Start {
                client: self.api_client.clone(),
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start { client } => Some(open(client).await),
                    DownloadRuntimeState::Downloading(download) => Some(download.advance().await),
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum DownloadRuntimeState {
    Start { client: ApiClient },
    Downloading(ActiveDownload),
    Finished,
}

struct ActiveDownload {
    file: tokio::fs::File,
    stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    written: u64,
    total: Option<u64>,
    path: PathBuf,
}

fn failed(error: AppError) -> (DownloadEvent, DownloadRuntimeState) {
    (DownloadEvent::Failed(error), DownloadRuntimeState::Finished)
}

fn io_error(action: &str, path: &std::path::Path, e: std::io::Error) -> AppError {
    AppError::Io(format!("{} {}: {}", action, path.display(), e))
}

async fn open(client: ApiClient) -> (DownloadEvent, DownloadRuntimeState) {
    let suggested = match client.summary_filename().await {
        Ok(name) => name.unwrap_or_else(|| DEFAULT_SUMMARY_FILENAME.to_string()),
        Err(e) => return failed(AppError::Api(e.to_string())),
    };

    let Some(path) = DownloadCoordinator::choose_save_path(suggested).await else {
        return (DownloadEvent::Cancelled, DownloadRuntimeState::Finished);
    };

    let SummaryStream { total, bytes } = match client.download_summary().await {
        Ok(download) => download,
        Err(e) => return failed(AppError::Api(e.to_string())),
    };

    match tokio::fs::File::create(&path).await {
        Ok(file) => (
            DownloadEvent::Progress(0.0),
            DownloadRuntimeState::Downloading(ActiveDownload {
                file,
                stream: bytes,
                written: 0,
                total,
                path,
            }),
        ),
        Err(e) => failed(io_error("Cannot create", &path, e)),
    }
}

impl ActiveDownload {
    fn fraction(&self) -> f32 {
        self.total
            .and_then(|total| percent(self.written, total))
            .map_or(0.0, |p| f32::from(p) / 100.0)
    }

    async fn advance(mut self) -> (DownloadEvent, DownloadRuntimeState) {
        let chunk = match self.stream.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return failed(AppError::Api(e.to_string())),
            None => {
                return match self.file.sync_all().await {
                    Ok(()) => (
                        DownloadEvent::Completed(self.path),
                        DownloadRuntimeState::Finished,
                    ),
                    Err(e) => failed(io_error("Cannot flush", &self.path, e)),
                };
            }
        };

        if let Err(e) = self.file.write_all(&chunk).await {
            return failed(io_error("Cannot write", &self.path, e));
        }
        self.written += chunk.len() as u64;

        (
            DownloadEvent::Progress(self.fraction()),
            DownloadRuntimeState::Downloading(self),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;

    fn coordinator_for(server: &mockito::ServerGuard) -> DownloadCoordinator {
        DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_missing_summary_fails_before_asking_for_a_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/download_summary")
            .with_status(404)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/download_summary")
            .expect(0)
            .create_async()
            .await;

        let events: Vec<DownloadEvent> = coordinator_for(&server).download_stream().collect().await;

        get.assert_async().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DownloadEvent::Failed(AppError::Api(msg)) if msg.contains("404")
        ));
    }

    #[tokio::test]
    async fn test_active_download_writes_chunks_then_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.txt");
        let chunks: Vec<crate::api::Result<bytes::Bytes>> = vec![
            Ok(bytes::Bytes::from_static(b"first ")),
            Ok(bytes::Bytes::from_static(b"summary")),
        ];

        let mut state = DownloadRuntimeState::Downloading(ActiveDownload {
            file: tokio::fs::File::create(&path).await.unwrap(),
            stream: futures::stream::iter(chunks).boxed(),
            written: 0,
            total: Some(13),
            path: path.clone(),
        });

        let mut events = Vec::new();
        while let DownloadRuntimeState::Downloading(download) = state {
            let (event, next) = download.advance().await;
            events.push(event);
            state = next;
        }

        assert!(matches!(events[0], DownloadEvent::Progress(p) if (p - 0.46).abs() < 1e-6));
        assert!(matches!(events[1], DownloadEvent::Progress(p) if p == 1.0));
        assert!(matches!(&events[2], DownloadEvent::Completed(p) if p == &path));
        assert_eq!(std::fs::read(&path).unwrap(), b"first summary");
    }

    #[tokio::test]
    async fn test_unknown_size_reports_zero_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.txt");
        let download = ActiveDownload {
            file: tokio::fs::File::create(&path).await.unwrap(),
            stream: futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"x"))]).boxed(),
            written: 0,
            total: None,
            path,
        };

        let (event, _) = download.advance().await;
        assert!(matches!(event, DownloadEvent::Progress(p) if p == 0.0));
    }
}
