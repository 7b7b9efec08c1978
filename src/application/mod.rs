pub mod download_coordinator;
pub mod orchestrator;
pub mod poller;
pub mod selection;
pub mod transfer;

pub use download_coordinator::{DownloadCoordinator, DownloadEvent};
pub use orchestrator::{BatchEvent, BatchStatus, UploadOrchestrator};
pub use poller::{CompletionPoller, PollTransition};
pub use selection::{SelectionEntry, SelectionRegistry};
pub use transfer::{Glyph, TransferEvent};
