use std::collections::HashSet;

use futures::{stream::BoxStream, StreamExt};

use crate::{
    api::ApiClient,
    domain::{AppError, BatchId, BatchOutcome, FileId, SelectedFile},
};

use super::transfer::{upload_stream, TransferEvent};

/// A transfer event tagged with where it belongs.
#[derive(Debug, Clone)]
pub struct BatchEvent {
    pub batch: BatchId,
    pub file: FileId,
    pub event: TransferEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running(BatchOutcome),
    /// Fired once per batch, on the last outstanding transfer.
    FullySucceeded(BatchOutcome),
    PartiallyFailed(BatchOutcome),
}

#[derive(Debug)]
struct BatchRun {
    id: BatchId,
    outstanding: HashSet<FileId>,
    completed: usize,
    outcome: BatchOutcome,
    signaled: bool,
}

impl BatchRun {
    fn is_settled(&self) -> bool {
        self.completed == self.outcome.total
    }
}

/// Launches one transfer per selected file and folds their outcomes into one verdict.
#[derive(Debug, Default)]
pub struct UploadOrchestrator {
    max_concurrent: Option<usize>,
    next_batch: u64,
    current: Option<BatchRun>,
}

impl UploadOrchestrator {
    pub fn new(max_concurrent: Option<usize>) -> Self {
        Self {
            max_concurrent,
            ..Self::default()
        }
    }

    /// Still waiting for at least one transfer of the current batch.
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|run| !run.is_settled())
    }

    pub fn is_current(&self, batch: BatchId) -> bool {
        self.current.as_ref().is_some_and(|run| run.id == batch)
    }

    /// Open a new batch over `files`.
    ///
    /// Refused when nothing is selected, while the previous batch is still uploading,
    /// or while a summarization run is active.
    pub fn begin(
        &mut self,
        files: &[SelectedFile],
        summary_active: bool,
    ) -> Result<BatchId, AppError> {
        if files.is_empty() {
            return Err(AppError::EmptySelection);
        }
        if self.is_running() || summary_active {
            return Err(AppError::RunInProgress);
        }

        let id = BatchId(self.next_batch);
        self.next_batch += 1;
        self.current = Some(BatchRun {
            id,
            outstanding: files.iter().map(|f| f.id).collect(),
            completed: 0,
            outcome: BatchOutcome {
                succeeded: 0,
                total: files.len(),
                any_failed: false,
            },
            signaled: false,
        });
        Ok(id)
    }

    /// Merge every file's upload into one stream, honoring the concurrency cap.
    pub fn launch(
        &self,
        batch: BatchId,
        files: Vec<SelectedFile>,
        client: ApiClient,
    ) -> BoxStream<'static, BatchEvent> {
        let transfers = files.into_iter().map(move |selected| {
            let file = selected.id;
            upload_stream(client.clone(), selected.meta)
                .map(move |event| BatchEvent { batch, file, event })
                .boxed()
        });

        futures::stream::iter(transfers)
            .flatten_unordered(self.max_concurrent)
            .boxed()
    }

    /// Record a terminal transfer result.
    ///
    /// Returns `None` for results that do not belong to the current batch or that
    /// were already counted.
    pub fn record(&mut self, batch: BatchId, file: FileId, succeeded: bool) -> Option<BatchStatus> {
        let run = self.current.as_mut().filter(|run| run.id == batch)?;
        if !run.outstanding.remove(&file) {
            return None;
        }

        run.completed += 1;
        if succeeded {
            run.outcome.succeeded += 1;
        } else {
            run.outcome.any_failed = true;
        }

        if !run.is_settled() {
            return Some(BatchStatus::Running(run.outcome));
        }

        if run.outcome.is_fully_successful() && !run.signaled {
            run.signaled = true;
            Some(BatchStatus::FullySucceeded(run.outcome))
        } else {
            Some(BatchStatus::PartiallyFailed(run.outcome))
        }
    }
}
