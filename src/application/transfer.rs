use futures::{stream::BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    api::{self, ApiClient, UploadResponse},
    domain::{FileMeta, TransferState},
    utils::percent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Progress { sent: u64, total: u64 },
    Succeeded,
    Failed(String),
}

/// What the indicator next to a file shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Busy,
    Removable,
}

/// Owns the transfer state of a single selected file.
#[derive(Debug, Clone)]
pub struct TransferTracker {
    state: TransferState,
    percent: u8,
}

impl Default for TransferTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferTracker {
    pub fn new() -> Self {
        Self {
            state: TransferState::Pending,
            percent: 0,
        }
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Switches to `Removable` once every byte has left, which may precede the server's answer.
    pub fn glyph(&self) -> Glyph {
        if self.percent >= 100 {
            Glyph::Removable
        } else {
            Glyph::Busy
        }
    }

    pub fn is_removable(&self) -> bool {
        self.state == TransferState::Succeeded
    }

    /// Back to `Pending` for a fresh submission.
    pub fn reset(&mut self) {
        self.state = TransferState::Pending;
        self.percent = 0;
    }

    /// Apply a byte-level progress report. Returns the new percent if it moved.
    pub fn on_progress(&mut self, sent: u64, total: u64) -> Option<u8> {
        if self.state.is_terminal() {
            return None;
        }
        let changed = match percent(sent, total) {
            Some(p) if p > self.percent => {
                self.percent = p;
                Some(p)
            }
            _ => None,
        };
        self.state = TransferState::InProgress(self.percent);
        changed
    }

    /// Returns false if the transfer had already finished.
    pub fn succeed(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.percent = 100;
        self.state = TransferState::Succeeded;
        true
    }

    /// Returns false if the transfer had already finished.
    pub fn fail(&mut self, reason: String) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = TransferState::Failed(reason);
        true
    }
}

/// Upload `file`, yielding progress events followed by exactly one terminal event.
pub fn upload_stream(client: ApiClient, file: FileMeta) -> BoxStream<'static, TransferEvent> {
    futures::stream::unfold(
        UploadRuntimeState::Start { client, file },
        |state| async move {
            match state {
                UploadRuntimeState::Start { client, file } => {
                    let (progress_tx, progress) = mpsc::unbounded_channel();
                    let total = file.size;
                    let request =
                        tokio::spawn(async move { client.upload_file(&file, progress_tx).await });

                    Some((
                        TransferEvent::Progress { sent: 0, total },
                        UploadRuntimeState::Sending { progress, request },
                    ))
                }
                UploadRuntimeState::Sending {
                    mut progress,
                    mut request,
                } => {
                    tokio::select! {
                        biased;

                        Some((sent, total)) = progress.recv() => Some((
                            TransferEvent::Progress { sent, total },
                            UploadRuntimeState::Sending { progress, request },
                        )),
                        outcome = &mut request => {
                            let event = match outcome {
                                Ok(Ok(response)) => {
                                    tracing::debug!("Server stored upload as {:?}", response.filename);
                                    TransferEvent::Succeeded
                                }
                                Ok(Err(e)) => TransferEvent::Failed(e.to_string()),
                                Err(e) => TransferEvent::Failed(format!("Upload task aborted: {}", e)),
                            };
                            Some((event, UploadRuntimeState::Finished))
                        }
                    }
                }
                UploadRuntimeState::Finished => None,
            }
        },
    )
    .boxed()
}

enum UploadRuntimeState {
    Start {
        client: ApiClient,
        file: FileMeta,
    },
    Sending {
        progress: mpsc::UnboundedReceiver<(u64, u64)>,
        request: JoinHandle<api::Result<UploadResponse>>,
    },
    Finished,
}
