pub mod dialogs;

use std::collections::HashMap;

use iced::{
    widget::{
        button, column, container, image, progress_bar, row, scrollable, text, Column, Space,
    },
    Alignment, Element, Length,
};

use crate::application::{Glyph, SelectionEntry, SelectionRegistry};
use crate::domain::{FileId, TransferState};

pub use dialogs::PickedFile;

/// Which part of the page is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Form,
    Working,
    Ready,
}

/// Main view state
pub struct UploadView {
    pub stage: Stage,
    pub status_message: String,
    pub is_uploading: bool,
    pub thumbnails: HashMap<FileId, image::Handle>,
    pub download_progress: Option<f32>,
    pub summary_preview: Option<String>,
}

impl Default for UploadView {
    fn default() -> Self {
        Self {
            stage: Stage::Form,
            status_message: "Choose the files you want summarized".to_string(),
            is_uploading: false,
            thumbnails: HashMap::new(),
            download_progress: None,
            summary_preview: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadMessage {
    SelectFilesPressed,
    RemovePressed(FileId),
    SubmitPressed,
    DownloadPressed,
    PreviewPressed,
}

impl UploadView {
    pub fn view<'a>(&'a self, selection: &'a SelectionRegistry) -> Element<'a, UploadMessage> {
        let body = match self.stage {
            Stage::Form => self.form(selection),
            Stage::Working => self.working(),
            Stage::Ready => self.ready(),
        };

        column![
            text("Paper Summarizer").size(32),
            Space::new().height(Length::Fixed(20.0)),
            body,
            Space::new().height(Length::Fixed(10.0)),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }

    fn form<'a>(&'a self, selection: &'a SelectionRegistry) -> Element<'a, UploadMessage> {
        let rows: Element<'a, UploadMessage> = if selection.is_empty() {
            text("No files selected yet").size(14).into()
        } else {
            Column::with_children(selection.iter().map(|entry| self.file_row(entry)))
                .spacing(8)
                .into()
        };

        column![
            button("Choose files")
                .on_press_maybe((!self.is_uploading).then_some(UploadMessage::SelectFilesPressed))
                .padding([10, 20]),
            scrollable(rows).height(Length::Fill),
            button("Summarize")
                .on_press_maybe((!self.is_uploading).then_some(UploadMessage::SubmitPressed))
                .padding([10, 20]),
        ]
        .spacing(10)
        .into()
    }

    fn file_row<'a>(&'a self, entry: &'a SelectionEntry) -> Element<'a, UploadMessage> {
        let tracker = &entry.tracker;
        let id = entry.file.id;

        // Clicking the indicator dismisses the file, but only once the server accepted it
        let indicator: Element<'a, UploadMessage> = match tracker.glyph() {
            Glyph::Busy => text("…").size(18).into(),
            Glyph::Removable => button(text("×").size(16))
                .on_press_maybe(
                    tracker
                        .is_removable()
                        .then_some(UploadMessage::RemovePressed(id)),
                )
                .padding([2, 8])
                .into(),
        };

        let label = match tracker.state() {
            TransferState::Pending => "Waiting".to_string(),
            TransferState::InProgress(p) => format!("{}%", p),
            TransferState::Succeeded => "Uploaded".to_string(),
            TransferState::Failed(reason) => format!("Failed: {}", reason),
        };

        let mut line = row![indicator].spacing(10).align_y(Alignment::Center);
        if let Some(handle) = self.thumbnails.get(&id) {
            line = line.push(
                image(handle.clone())
                    .width(Length::Fixed(40.0))
                    .height(Length::Fixed(40.0)),
            );
        }
        line.push(
            column![
                text(&entry.file.meta.name).size(14),
                progress_bar(0.0..=100.0, f32::from(tracker.percent())),
                text(label).size(12),
            ]
            .spacing(4)
            .width(Length::Fill),
        )
        .into()
    }

    fn working(&self) -> Element<'_, UploadMessage> {
        container(text("Summarizing your files, this can take a while...").size(18))
            .center_x(Length::Fill)
            .padding(40)
            .into()
    }

    fn ready(&self) -> Element<'_, UploadMessage> {
        let mut content = column![row![
            button("Download summary")
                .on_press_maybe(
                    self.download_progress
                        .is_none()
                        .then_some(UploadMessage::DownloadPressed)
                )
                .padding([10, 20]),
            button("Preview")
                .on_press(UploadMessage::PreviewPressed)
                .padding([10, 20]),
        ]
        .spacing(10)]
        .spacing(10)
        .align_x(Alignment::Center);

        if let Some(progress) = self.download_progress {
            content = content.push(progress_bar(0.0..=1.0, progress));
        }
        if let Some(summary) = &self.summary_preview {
            content = content.push(scrollable(text(summary).size(13)).height(Length::Fill));
        }

        container(content).center_x(Length::Fill).into()
    }
}
