use crate::api::{ApiClient, ApiConfig, ProgressStatus};
use crate::application::{
    BatchEvent, BatchStatus, CompletionPoller, DownloadCoordinator, DownloadEvent,
    PollTransition, SelectionRegistry, TransferEvent, UploadOrchestrator,
};
use crate::domain::AppError;
use crate::ui::dialogs::{pick_files, show_notice};
use crate::ui::{PickedFile, Stage, UploadMessage, UploadView};
use futures::StreamExt;
use iced::{Subscription, Task};
use rfd::MessageLevel;

pub struct SummarizerApp {
    view: UploadView,
    api_client: ApiClient,
    selection: SelectionRegistry,
    orchestrator: UploadOrchestrator,
    poller: CompletionPoller,
    downloader: DownloadCoordinator,
}

impl Default for SummarizerApp {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

impl SummarizerApp {
    pub fn new(config: ApiConfig) -> Self {
        let orchestrator = UploadOrchestrator::new(config.max_concurrent_uploads);
        let api_client = ApiClient::new(config);

        Self {
            view: UploadView::default(),
            downloader: DownloadCoordinator::new(api_client.clone()),
            api_client,
            selection: SelectionRegistry::new(),
            orchestrator,
            poller: CompletionPoller::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(UploadMessage),
    FilesPicked(Vec<PickedFile>),
    Transfer(BatchEvent),
    /// Answer to /start_summary, only logged
    SummaryRequested(Result<String, String>),
    PollTick,
    StatusReceived(Result<ProgressStatus, String>),
    PreviewReceived(Result<String, String>),
    Download(DownloadEvent),
    NoticeDismissed,
}

fn notice(level: MessageLevel, title: &'static str, description: String) -> Task<Message> {
    Task::perform(show_notice(level, title, description), |_| {
        Message::NoticeDismissed
    })
}

pub fn update(app: &mut SummarizerApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => return handle_ui(app, ui_msg),
        Message::FilesPicked(files) => {
            for PickedFile { meta, thumbnail } in files {
                tracing::debug!("Selected {} ({} bytes, {})", meta.name, meta.size, meta.mime);
                let id = app.selection.add(meta);
                if let Some(handle) = thumbnail {
                    app.view.thumbnails.insert(id, handle);
                }
            }
            app.view.status_message = format!("{} file(s) selected", app.selection.len());
        }
        Message::Transfer(batch_event) => return handle_transfer(app, batch_event),
        Message::SummaryRequested(result) => match result {
            Ok(status) => tracing::info!("Summarization requested: {}", status),
            // Not retried; polling continues regardless
            Err(e) => tracing::warn!("Failed to request summarization: {}", e),
        },
        Message::PollTick => {
            if app.poller.is_polling() {
                let client = app.api_client.clone();
                return Task::perform(
                    async move { client.check_progress().await.map_err(|e| e.to_string()) },
                    Message::StatusReceived,
                );
            }
        }
        Message::StatusReceived(result) => match result {
            Ok(status) => match app.poller.on_status(status.done) {
                PollTransition::Completed => {
                    tracing::info!("Summary ready after {} poll(s)", app.poller.polls());
                    app.view.stage = Stage::Ready;
                    app.view.status_message = "Your summary is ready".to_string();
                }
                PollTransition::Waiting => {
                    tracing::debug!(
                        "Summary not ready yet (server running: {})",
                        status.in_progress
                    );
                }
                PollTransition::Ignored => {
                    tracing::debug!(
                        "Ignoring status received in phase {:?}",
                        app.poller.phase()
                    );
                }
            },
            Err(e) => tracing::warn!("Progress check failed: {}", e),
        },
        Message::PreviewReceived(result) => match result {
            Ok(summary) => app.view.summary_preview = Some(summary),
            Err(e) => app.view.status_message = format!("Failed to load summary: {}", e),
        },
        Message::Download(event) => match event {
            DownloadEvent::Progress(progress) => {
                app.view.download_progress = Some(progress);
                app.view.status_message = format!("Downloading: {:.1}%", progress * 100.0);
            }
            DownloadEvent::Completed(path) => {
                app.view.download_progress = None;
                app.view.status_message = format!("Saved: {}", path.display());
            }
            DownloadEvent::Cancelled => {
                app.view.download_progress = None;
                app.view.status_message = "Download cancelled".to_string();
            }
            DownloadEvent::Failed(e) => {
                app.view.download_progress = None;
                app.view.status_message = format!("Download failed: {}", e);
            }
        },
        Message::NoticeDismissed => {}
    }
    Task::none()
}

fn handle_ui(app: &mut SummarizerApp, message: UploadMessage) -> Task<Message> {
    match message {
        UploadMessage::SelectFilesPressed => {
            if app.view.stage == Stage::Form && !app.orchestrator.is_running() {
                return Task::perform(pick_files(), Message::FilesPicked);
            }
        }
        UploadMessage::RemovePressed(id) => {
            if app.selection.remove(id) {
                app.view.thumbnails.remove(&id);
            }
        }
        UploadMessage::SubmitPressed => return submit(app),
        UploadMessage::DownloadPressed => {
            if app.view.stage == Stage::Ready && app.view.download_progress.is_none() {
                app.view.download_progress = Some(0.0);
                app.view.status_message = "Fetching summary...".to_string();
                return Task::stream(app.downloader.download_stream().map(Message::Download));
            }
        }
        UploadMessage::PreviewPressed => {
            let client = app.api_client.clone();
            return Task::perform(
                async move { client.get_summary().await.map_err(|e| e.to_string()) },
                Message::PreviewReceived,
            );
        }
    }
    Task::none()
}

fn submit(app: &mut SummarizerApp) -> Task<Message> {
    let files = app.selection.files();
    let batch = match app.orchestrator.begin(&files, app.poller.is_active()) {
        Ok(batch) => batch,
        Err(AppError::EmptySelection) => {
            let message = AppError::EmptySelection.to_string();
            app.view.status_message = message.clone();
            return notice(MessageLevel::Warning, "Nothing to upload", message);
        }
        Err(e) => {
            tracing::warn!("Submission refused: {}", e);
            app.view.status_message = e.to_string();
            return Task::none();
        }
    };

    tracing::info!("Uploading {} file(s) as batch {:?}", files.len(), batch);
    app.selection.reset_transfers();
    app.view.is_uploading = true;
    app.view.status_message = format!("Uploading {} file(s)...", files.len());

    let events = app
        .orchestrator
        .launch(batch, files, app.api_client.clone());
    Task::stream(events.map(Message::Transfer))
}

fn handle_transfer(app: &mut SummarizerApp, batch_event: BatchEvent) -> Task<Message> {
    let BatchEvent { batch, file, event } = batch_event;
    if !app.orchestrator.is_current(batch) {
        return Task::none();
    }

    let name = app
        .selection
        .get(file)
        .map(|entry| entry.file.meta.name.clone())
        .unwrap_or_default();

    let (status, failure) = match event {
        TransferEvent::Progress { sent, total } => {
            if let Some(tracker) = app.selection.tracker_mut(file) {
                tracker.on_progress(sent, total);
            }
            return Task::none();
        }
        TransferEvent::Succeeded => {
            if let Some(tracker) = app.selection.tracker_mut(file) {
                tracker.succeed();
            }
            tracing::info!("Uploaded {}", name);
            (app.orchestrator.record(batch, file, true), None)
        }
        TransferEvent::Failed(reason) => {
            if let Some(tracker) = app.selection.tracker_mut(file) {
                tracker.fail(reason.clone());
            }
            tracing::error!("Upload of {} failed: {}", name, reason);
            let error = AppError::Upload { file: name, reason };
            (app.orchestrator.record(batch, file, false), Some(error))
        }
    };

    let alert = match failure {
        Some(error) => {
            app.view.status_message = error.to_string();
            notice(MessageLevel::Error, "Upload failed", error.to_string())
        }
        None => Task::none(),
    };

    let next = match status {
        Some(BatchStatus::FullySucceeded(outcome)) => {
            tracing::info!("All {} upload(s) succeeded", outcome.total);
            app.view.is_uploading = false;
            begin_summary(app)
        }
        Some(BatchStatus::PartiallyFailed(outcome)) => {
            tracing::warn!(
                "Batch finished with failures: {}/{} uploaded",
                outcome.succeeded,
                outcome.total
            );
            app.view.is_uploading = false;
            app.view.status_message = format!(
                "{} of {} file(s) uploaded. Fix the failed files and submit again.",
                outcome.succeeded, outcome.total
            );
            Task::none()
        }
        Some(BatchStatus::Running(outcome)) => {
            tracing::debug!(
                "{} of {} upload(s) succeeded so far",
                outcome.succeeded,
                outcome.total
            );
            Task::none()
        }
        None => Task::none(),
    };

    Task::batch([alert, next])
}

fn begin_summary(app: &mut SummarizerApp) -> Task<Message> {
    if let Err(e) = app.poller.request_job() {
        tracing::warn!("Not starting summarization: {}", e);
        return Task::none();
    }

    app.view.stage = Stage::Working;
    app.view.status_message = "Summarizing...".to_string();

    let client = app.api_client.clone();
    let request = Task::perform(
        async move {
            client
                .start_summary()
                .await
                .map(|response| response.status)
                .map_err(|e| e.to_string())
        },
        Message::SummaryRequested,
    );

    app.poller.start_polling();
    request
}

pub fn subscription(app: &SummarizerApp) -> Subscription<Message> {
    if app.poller.is_polling() {
        iced::time::every(app.api_client.config().poll_interval).map(|_| Message::PollTick)
    } else {
        Subscription::none()
    }
}

pub fn view(app: &SummarizerApp) -> iced::Element<'_, Message> {
    app.view.view(&app.selection).map(Message::UiMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transfer::TransferTracker;
    use crate::domain::{BatchId, FileId, FileMeta, PollPhase, TransferState};

    fn app_with(names: &[&str]) -> (SummarizerApp, Vec<FileId>) {
        let mut app = SummarizerApp::default();
        let ids = names
            .iter()
            .map(|name| {
                app.selection.add(FileMeta {
                    path: name.into(),
                    name: name.to_string(),
                    mime: "application/pdf".to_string(),
                    size: 100,
                })
            })
            .collect();
        (app, ids)
    }

    fn start_batch(app: &mut SummarizerApp) -> BatchId {
        let files = app.selection.files();
        let batch = app.orchestrator.begin(&files, false).unwrap();
        app.view.is_uploading = true;
        batch
    }

    fn transfer(batch: BatchId, file: FileId, event: TransferEvent) -> Message {
        Message::Transfer(BatchEvent { batch, file, event })
    }

    #[test]
    fn test_empty_submission_stays_on_form() {
        let mut app = SummarizerApp::default();
        let _ = update(&mut app, Message::UiMessage(UploadMessage::SubmitPressed));

        assert_eq!(app.view.status_message, AppError::EmptySelection.to_string());
        assert!(!app.orchestrator.is_running());
        assert_eq!(app.view.stage, Stage::Form);
    }

    #[test]
    fn test_all_uploads_succeed_then_poll_until_done() {
        let (mut app, ids) = app_with(&["a.pdf", "b.pdf"]);
        let batch = start_batch(&mut app);

        for id in &ids {
            let _ = update(
                &mut app,
                transfer(batch, *id, TransferEvent::Progress { sent: 100, total: 100 }),
            );
        }
        assert!(app
            .selection
            .iter()
            .all(|e| e.tracker.glyph() == crate::application::Glyph::Removable));

        let _ = update(&mut app, transfer(batch, ids[0], TransferEvent::Succeeded));
        assert_eq!(app.poller.phase(), PollPhase::Idle);
        assert_eq!(app.view.stage, Stage::Form);

        let _ = update(&mut app, transfer(batch, ids[1], TransferEvent::Succeeded));
        assert!(app.poller.is_polling());
        assert_eq!(app.view.stage, Stage::Working);
        assert!(!app.view.is_uploading);

        let _ = update(
            &mut app,
            Message::StatusReceived(Ok(ProgressStatus {
                done: false,
                in_progress: true,
            })),
        );
        assert_eq!(app.view.stage, Stage::Working);

        let _ = update(
            &mut app,
            Message::StatusReceived(Ok(ProgressStatus {
                done: true,
                in_progress: false,
            })),
        );
        assert_eq!(app.view.stage, Stage::Ready);
        assert_eq!(app.poller.phase(), PollPhase::Done);

        // A late answer must not touch the ready page
        app.view.status_message = "unchanged".to_string();
        let _ = update(
            &mut app,
            Message::StatusReceived(Ok(ProgressStatus {
                done: true,
                in_progress: false,
            })),
        );
        assert_eq!(app.view.status_message, "unchanged");
        assert_eq!(app.poller.polls(), 2);
    }

    #[test]
    fn test_failed_upload_never_starts_summary() {
        let (mut app, ids) = app_with(&["broken.pdf"]);
        let batch = start_batch(&mut app);

        let _ = update(
            &mut app,
            transfer(batch, ids[0], TransferEvent::Failed("HTTP 500".to_string())),
        );

        assert_eq!(app.poller.phase(), PollPhase::Idle);
        assert_eq!(app.view.stage, Stage::Form);
        assert!(!app.view.is_uploading);
        assert!(matches!(
            app.selection.get(ids[0]).unwrap().tracker.state(),
            TransferState::Failed(_)
        ));

        let _ = update(&mut app, Message::PollTick);
        assert_eq!(app.poller.phase(), PollPhase::Idle);
    }

    #[test]
    fn test_events_from_an_old_batch_are_dropped() {
        let (mut app, ids) = app_with(&["a.pdf"]);
        let first = start_batch(&mut app);
        let _ = update(
            &mut app,
            transfer(first, ids[0], TransferEvent::Failed("timeout".to_string())),
        );

        app.selection.reset_transfers();
        let second = start_batch(&mut app);
        let _ = update(&mut app, transfer(first, ids[0], TransferEvent::Succeeded));
        assert_eq!(
            app.selection.get(ids[0]).unwrap().tracker.state(),
            TransferTracker::new().state()
        );

        let _ = update(&mut app, transfer(second, ids[0], TransferEvent::Succeeded));
        assert!(app.poller.is_polling());
    }

    #[test]
    fn test_remove_only_after_success() {
        let (mut app, ids) = app_with(&["a.pdf", "b.pdf"]);
        let batch = start_batch(&mut app);

        let _ = update(&mut app, Message::UiMessage(UploadMessage::RemovePressed(ids[0])));
        assert_eq!(app.selection.len(), 2);

        let _ = update(
            &mut app,
            transfer(batch, ids[1], TransferEvent::Failed("HTTP 413".to_string())),
        );
        let _ = update(&mut app, transfer(batch, ids[0], TransferEvent::Succeeded));
        let _ = update(&mut app, Message::UiMessage(UploadMessage::RemovePressed(ids[0])));
        let _ = update(&mut app, Message::UiMessage(UploadMessage::RemovePressed(ids[1])));

        let remaining: Vec<FileId> = app.selection.iter().map(|e| e.file.id).collect();
        assert_eq!(remaining, vec![ids[1]]);
    }
}
