use std::path::{Path, PathBuf};

use iced::widget::image::Handle;
use rfd::{MessageButtons, MessageLevel};

use crate::{domain::FileMeta, utils::guess_mime};

const THUMBNAIL_SIZE: u32 = 48;

/// A file coming back from the picker, with a preview if it is an image.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub meta: FileMeta,
    pub thumbnail: Option<Handle>,
}

/// Let the user choose any number of files of any type.
pub async fn pick_files() -> Vec<PickedFile> {
    let Some(handles) = rfd::AsyncFileDialog::new()
        .set_title("Select files to summarize")
        .pick_files()
        .await
    else {
        return Vec::new();
    };

    let mut picked = Vec::with_capacity(handles.len());
    for handle in handles {
        let path = handle.path().to_path_buf();
        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let meta = FileMeta {
            name: handle.file_name(),
            mime: guess_mime(&path).to_string(),
            size,
            path,
        };
        let thumbnail = if meta.is_image() {
            load_thumbnail(meta.path.clone()).await
        } else {
            None
        };

        picked.push(PickedFile { meta, thumbnail });
    }
    picked
}

async fn load_thumbnail(path: PathBuf) -> Option<Handle> {
    tokio::task::spawn_blocking(move || decode_thumbnail(&path))
        .await
        .ok()
        .flatten()
}

fn decode_thumbnail(path: &Path) -> Option<Handle> {
    let img = match ::image::open(path) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!("No thumbnail for {}: {}", path.display(), e);
            return None;
        }
    };
    let rgba = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_rgba8();
    let (width, height) = rgba.dimensions();
    Some(Handle::from_rgba(width, height, rgba.into_raw()))
}

/// Blocking notice the user has to acknowledge.
pub async fn show_notice(level: MessageLevel, title: &'static str, description: String) {
    let _ = rfd::AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show()
        .await;
}
