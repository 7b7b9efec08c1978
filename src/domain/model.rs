use std::path::PathBuf;

/// Identifies one entry of the selection; doubles as the handle of its list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

/// Identifies one submission of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl FileMeta {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub id: FileId,
    pub meta: FileMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    InProgress(u8),
    Succeeded,
    Failed(String),
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Succeeded | TransferState::Failed(_))
    }
}

/// Aggregate over every transfer of the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub total: usize,
    pub any_failed: bool,
}

impl BatchOutcome {
    pub fn is_fully_successful(&self) -> bool {
        !self.any_failed && self.succeeded == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    JobRequested,
    Polling,
    Done,
}
