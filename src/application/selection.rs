use crate::domain::{FileId, FileMeta, SelectedFile};

use super::transfer::TransferTracker;

/// One row of the selection: the file and the tracker that owns its transfer state.
#[derive(Debug, Clone)]
pub struct SelectionEntry {
    pub file: SelectedFile,
    pub tracker: TransferTracker,
}

/// Files the user picked, in the order they were picked.
#[derive(Debug, Default)]
pub struct SelectionRegistry {
    entries: Vec<SelectionEntry>,
    next_id: u64,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate names are kept as separate entries.
    pub fn add(&mut self, meta: FileMeta) -> FileId {
        let id = FileId(self.next_id);
        self.next_id += 1;
        self.entries.push(SelectionEntry {
            file: SelectedFile { id, meta },
            tracker: TransferTracker::new(),
        });
        id
    }

    /// Only a successfully uploaded file can be dismissed; anything else is left alone.
    pub fn remove(&mut self, id: FileId) -> bool {
        match self.entries.iter().position(|e| e.file.id == id) {
            Some(index) if self.entries[index].tracker.is_removable() => {
                self.entries.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: FileId) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.file.id == id)
    }

    pub fn tracker_mut(&mut self, id: FileId) -> Option<&mut TransferTracker> {
        self.entries
            .iter_mut()
            .find(|e| e.file.id == id)
            .map(|e| &mut e.tracker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the selected files for a batch run.
    pub fn files(&self) -> Vec<SelectedFile> {
        self.entries.iter().map(|e| e.file.clone()).collect()
    }

    pub fn reset_transfers(&mut self) {
        for entry in &mut self.entries {
            entry.tracker.reset();
        }
    }
}
