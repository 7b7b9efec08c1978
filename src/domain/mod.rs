pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{BatchId, BatchOutcome, FileId, FileMeta, PollPhase, SelectedFile, TransferState};
