use std::collections::VecDeque;

use crate::models::{Note, Page, Timestamp};

pub const MAX_UNDO: usize = 50;

/// The content-bearing part of a note. Tasks, category and archival state are not
/// part of the undo scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub pages: Vec<Page>,
}

impl Snapshot {
    pub fn capture(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            pages: note.pages.clone(),
        }
    }

    /// Returns `note` with the snapshot's fields restored.
    pub fn apply_to(&self, note: &Note, now: Timestamp) -> Note {
        let mut restored = note.clone();
        restored.title = self.title.clone();
        restored.content = self.content.clone();
        restored.tags = self.tags.clone();
        restored.pages = self.pages.clone();
        crate::pages::sync_legacy_content(&mut restored);
        restored.updated_at = now;
        restored
    }
}

/// Linear undo/redo for the open note. Not persisted.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    suppress_next: bool,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the pre-edit note for every tracked edit. A replayed undo/redo
    /// consumes the suppress flag instead of recording itself.
    pub fn record(&mut self, before: &Note) {
        if self.suppress_next {
            self.suppress_next = false;
            return;
        }
        self.undo.push_back(Snapshot::capture(before));
        while self.undo.len() > MAX_UNDO {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    pub fn undo(&mut self, current: &Note, now: Timestamp) -> Option<Note> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(Snapshot::capture(current));
        self.suppress_next = true;
        Some(snapshot.apply_to(current, now))
    }

    pub fn redo(&mut self, current: &Note, now: Timestamp) -> Option<Note> {
        let snapshot = self.redo.pop()?;
        self.undo.push_back(Snapshot::capture(current));
        self.suppress_next = true;
        Some(snapshot.apply_to(current, now))
    }

    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.suppress_next = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CATEGORY;
    use crate::pages::set_page_content;

    /// Mirrors how the editor drives the history: record the pre-edit state, then
    /// apply the change.
    fn edit(history: &mut EditHistory, note: &mut Note, text: &str, now: i64) {
        history.record(note);
        set_page_content(note, 0, text, now);
        note.title = format!("title {text}");
        note.tags.push(text.to_lowercase());
    }

    /// Replays the result through the same tracked path, as the editor does.
    fn replay(history: &mut EditHistory, note: &mut Note, next: Note) {
        history.record(note);
        *note = next;
    }

    #[test]
    fn n_edits_then_n_undos_restore_original_and_fill_redo() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        note.title = "start".to_string();
        let original = Snapshot::capture(&note);

        for (i, text) in ["a", "b", "c", "d"].iter().enumerate() {
            edit(&mut history, &mut note, text, i as i64 + 1);
        }
        for i in 0..4 {
            let prev = history.undo(&note, 100 + i).expect("undo available");
            replay(&mut history, &mut note, prev);
        }

        assert_eq!(Snapshot::capture(&note), original);
        assert_eq!(history.redo_len(), 4);
        assert_eq!(history.undo_len(), 0);
        assert!(history.undo(&note, 200).is_none());
    }

    #[test]
    fn undo_then_redo_is_observably_a_no_op() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        edit(&mut history, &mut note, "one", 1);
        edit(&mut history, &mut note, "two", 2);
        let before = Snapshot::capture(&note);

        let prev = history.undo(&note, 3).unwrap();
        replay(&mut history, &mut note, prev);
        let next = history.redo(&note, 4).unwrap();
        replay(&mut history, &mut note, next);

        assert_eq!(Snapshot::capture(&note), before);
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(note.updated_at, 4);
    }

    #[test]
    fn undo_stack_is_capped_and_evicts_oldest() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        for i in 0..(MAX_UNDO + 1) {
            edit(&mut history, &mut note, &format!("v{i}"), i as i64);
        }
        assert_eq!(history.undo_len(), MAX_UNDO);

        let mut oldest = None;
        while let Some(prev) = history.undo(&note, 1000) {
            replay(&mut history, &mut note, prev.clone());
            oldest = Some(prev);
        }
        // The very first pre-edit state (empty title) was evicted.
        assert_eq!(oldest.unwrap().title, "title v0");
    }

    #[test]
    fn new_edit_clears_redo_branch() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        edit(&mut history, &mut note, "a", 1);
        edit(&mut history, &mut note, "b", 2);
        let prev = history.undo(&note, 3).unwrap();
        replay(&mut history, &mut note, prev);
        assert!(history.can_redo());

        edit(&mut history, &mut note, "c", 4);
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn undo_leaves_tasks_and_metadata_alone() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        edit(&mut history, &mut note, "a", 1);
        note.category = "Work".to_string();
        note.tasks.push(
            crate::task::create_task("x", crate::models::Importance::Low, None, 2).unwrap(),
        );
        let prev = history.undo(&note, 3).unwrap();
        assert_eq!(prev.category, "Work");
        assert_eq!(prev.tasks.len(), 1);
        assert!(prev.title.is_empty());
    }

    #[test]
    fn restored_pages_keep_active_pointer_valid() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        history.record(&note);
        crate::pages::add_page(&mut note, 1);
        crate::pages::add_page(&mut note, 2);
        assert_eq!(note.active_page_index, 2);

        let prev = history.undo(&note, 3).unwrap();
        assert_eq!(prev.pages.len(), 1);
        assert_eq!(prev.active_page_index, 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut history = EditHistory::new();
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        edit(&mut history, &mut note, "a", 1);
        let _ = history.undo(&note, 2);
        history.reset();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        // The suppress flag is cleared too, so the next edit records.
        history.record(&note);
        assert_eq!(history.undo_len(), 1);
    }
}
