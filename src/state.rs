use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::editor::{apply_edit, NoteEdit};
use crate::events::{DueReminder, StatePayload};
use crate::history::EditHistory;
use crate::lifecycle::{self, DeleteOutcome};
use crate::models::{AnalysisResult, Note, Settings, SettingsFile, Task, Theme, Timestamp};
use crate::persistence::LoadedState;
use crate::save_status::{SaveIndicator, SaveStatus};
use crate::task::merge_suggested_tasks;

const SCHEMA_VERSION: u32 = 1;

/// Single owner of the workspace. Commands read and update through it; nothing else
/// holds note state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
    write_lock: Arc<Mutex<()>>,
}

/// Undo/redo availability for the open note.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HistoryState {
    pub note_id: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                notes: Vec::new(),
                theme: Theme::default(),
                custom_categories: Vec::new(),
                settings: Settings::default(),
                active_note_id: None,
                history: EditHistory::new(),
                save_status: SaveIndicator::default(),
                loaded: false,
            })),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Installs loaded records and opens the write-back gate.
    pub fn hydrate(&self, loaded: LoadedState) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.save_status.set_delays(
            Duration::from_millis(loaded.settings.save_debounce_ms),
            Duration::from_millis(loaded.settings.saved_display_ms),
        );
        guard.notes = loaded.notes;
        guard.theme = loaded.theme;
        guard.custom_categories = loaded.custom_categories;
        guard.settings = loaded.settings;
        guard.active_note_id = None;
        guard.history.reset();
        guard.loaded = true;
    }

    /// Held for the duration of a disk write so writers from commands and the
    /// scheduler never share the temp files.
    pub fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("write lock poisoned")
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().expect("state poisoned").loaded
    }

    pub fn payload(&self) -> StatePayload {
        let guard = self.inner.lock().expect("state poisoned");
        StatePayload {
            notes: guard.notes.clone(),
            theme: guard.theme,
            custom_categories: guard.custom_categories.clone(),
        }
    }

    pub fn notes(&self) -> Vec<Note> {
        self.inner.lock().expect("state poisoned").notes.clone()
    }

    pub fn note(&self, note_id: &str) -> Option<Note> {
        let guard = self.inner.lock().expect("state poisoned");
        lifecycle::find_note(&guard.notes, note_id).cloned()
    }

    pub fn theme(&self) -> Theme {
        self.inner.lock().expect("state poisoned").theme
    }

    pub fn custom_categories(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("state poisoned")
            .custom_categories
            .clone()
    }

    pub fn settings(&self) -> Settings {
        self.inner.lock().expect("state poisoned").settings.clone()
    }

    pub fn settings_file(&self) -> SettingsFile {
        let guard = self.inner.lock().expect("state poisoned");
        SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings: guard.settings.clone(),
        }
    }

    pub fn update_settings(&self, settings: Settings) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.save_status.set_delays(
            Duration::from_millis(settings.save_debounce_ms),
            Duration::from_millis(settings.saved_display_ms),
        );
        guard.settings = settings;
    }

    pub fn create_note(&self, now: Timestamp) -> Note {
        let mut guard = self.inner.lock().expect("state poisoned");
        let category = guard.settings.default_category.clone();
        let note = lifecycle::create_note(&mut guard.notes, &category, now);
        guard.open(&note.id);
        note
    }

    /// Switching to a different note starts a fresh history.
    pub fn open_note(&self, note_id: &str) -> Option<Note> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let note = lifecycle::find_note(&guard.notes, note_id).cloned()?;
        guard.open(note_id);
        Some(note)
    }

    /// Returns the note and whether the edit changed it. Unchanged edits leave
    /// history, the save indicator and `updated_at` alone.
    pub fn edit_note(
        &self,
        note_id: &str,
        edit: &NoteEdit,
        now: Timestamp,
        instant: Instant,
    ) -> Option<(Note, bool)> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let before = lifecycle::find_note(&guard.notes, note_id).cloned()?;
        guard.open(note_id);
        let mut after = before.clone();
        if !apply_edit(&mut after, edit, now) {
            return Some((before, false));
        }
        if edit.is_tracked() {
            guard.commit_tracked(&before, after.clone(), instant);
        } else {
            lifecycle::replace_note(&mut guard.notes, after.clone());
        }
        Some((after, true))
    }

    /// `None` when there is nothing to undo for this note.
    pub fn undo(&self, note_id: &str, now: Timestamp, instant: Instant) -> Option<Note> {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.active_note_id.as_deref() != Some(note_id) {
            return None;
        }
        let current = lifecycle::find_note(&guard.notes, note_id).cloned()?;
        let restored = guard.history.undo(&current, now)?;
        guard.commit_tracked(&current, restored.clone(), instant);
        Some(restored)
    }

    pub fn redo(&self, note_id: &str, now: Timestamp, instant: Instant) -> Option<Note> {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.active_note_id.as_deref() != Some(note_id) {
            return None;
        }
        let current = lifecycle::find_note(&guard.notes, note_id).cloned()?;
        let restored = guard.history.redo(&current, now)?;
        guard.commit_tracked(&current, restored.clone(), instant);
        Some(restored)
    }

    pub fn history_state(&self) -> HistoryState {
        let guard = self.inner.lock().expect("state poisoned");
        HistoryState {
            note_id: guard.active_note_id.clone(),
            can_undo: guard.history.can_undo(),
            can_redo: guard.history.can_redo(),
            undo_depth: guard.history.undo_len(),
            redo_depth: guard.history.redo_len(),
        }
    }

    /// Runs `f` against the note's task list. `f` returns its result and whether it
    /// changed anything; only a change refreshes `updated_at`. Task changes are
    /// outside the undo scope.
    pub fn update_tasks<R>(
        &self,
        note_id: &str,
        now: Timestamp,
        f: impl FnOnce(&mut Vec<Task>) -> (R, bool),
    ) -> Option<R> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let note = guard.notes.iter_mut().find(|n| n.id == note_id)?;
        let (result, changed) = f(&mut note.tasks);
        if changed {
            note.updated_at = now;
        }
        Some(result)
    }

    /// Merges against whatever the note looks like now, not when the request started.
    pub fn apply_analysis(
        &self,
        note_id: &str,
        result: &AnalysisResult,
        now: Timestamp,
    ) -> Option<usize> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let note = guard.notes.iter_mut().find(|n| n.id == note_id)?;
        let added = merge_suggested_tasks(&mut note.tasks, &result.suggested_tasks, now);
        if added > 0 {
            note.updated_at = now;
        }
        Some(added)
    }

    pub fn delete_note(&self, note_id: &str, now: Timestamp) -> DeleteOutcome {
        let mut guard = self.inner.lock().expect("state poisoned");
        let outcome = lifecycle::delete_note(&mut guard.notes, note_id, now);
        if outcome != DeleteOutcome::NotFound {
            guard.close_if_active(note_id);
        }
        outcome
    }

    pub fn restore_note(&self, note_id: &str, now: Timestamp) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        lifecycle::restore_note(&mut guard.notes, note_id, now)
    }

    pub fn purge_note(&self, note_id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let removed = lifecycle::purge_note(&mut guard.notes, note_id);
        if removed {
            guard.close_if_active(note_id);
        }
        removed
    }

    pub fn empty_vault(&self) -> usize {
        let mut guard = self.inner.lock().expect("state poisoned");
        let removed = lifecycle::empty_vault(&mut guard.notes);
        let active_gone = guard
            .active_note_id
            .as_deref()
            .map(|id| lifecycle::find_note(&guard.notes, id).is_none())
            .unwrap_or(false);
        if active_gone {
            guard.active_note_id = None;
            guard.history.reset();
        }
        removed
    }

    /// Appends imported notes to the front of the collection.
    pub fn import_notes(&self, notes: Vec<Note>) -> usize {
        let mut guard = self.inner.lock().expect("state poisoned");
        let count = notes.len();
        for note in notes.into_iter().rev() {
            guard.notes.insert(0, note);
        }
        count
    }

    pub fn set_theme(&self, theme: Theme) {
        self.inner.lock().expect("state poisoned").theme = theme;
    }

    pub fn add_custom_category(&self, name: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        lifecycle::add_custom_category(&mut guard.custom_categories, name)
    }

    pub fn remove_custom_category(&self, name: &str, now: Timestamp) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let default_category = guard.settings.default_category.clone();
        let AppData {
            custom_categories,
            notes,
            ..
        } = &mut *guard;
        lifecycle::remove_custom_category(custom_categories, notes, name, &default_category, now)
    }

    pub fn save_status(&self) -> SaveStatus {
        self.inner.lock().expect("state poisoned").save_status.status()
    }

    pub fn poll_save_status(&self, instant: Instant) -> Option<SaveStatus> {
        self.inner
            .lock()
            .expect("state poisoned")
            .save_status
            .poll(instant)
    }

    /// Pending tasks whose reminder time has passed. Each fires once until re-armed.
    pub fn take_due_reminders(&self, now: Timestamp) -> Vec<DueReminder> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let mut due = Vec::new();
        for note in guard.notes.iter_mut().filter(|n| !n.is_archived) {
            for task in note.tasks.iter_mut() {
                if task.completed || task.reminder_fired {
                    continue;
                }
                if task.status != crate::models::TaskStatus::Pending {
                    continue;
                }
                let Some(remind_at) = task.reminder_at else {
                    continue;
                };
                if now >= remind_at {
                    task.reminder_fired = true;
                    due.push(DueReminder {
                        note_id: note.id.clone(),
                        note_title: note.title.clone(),
                        task: task.clone(),
                    });
                }
            }
        }
        due
    }
}

#[derive(Debug)]
struct AppData {
    notes: Vec<Note>,
    theme: Theme,
    custom_categories: Vec<String>,
    settings: Settings,
    active_note_id: Option<String>,
    history: EditHistory,
    save_status: SaveIndicator,
    loaded: bool,
}

impl AppData {
    fn open(&mut self, note_id: &str) {
        if self.active_note_id.as_deref() != Some(note_id) {
            self.active_note_id = Some(note_id.to_string());
            self.history.reset();
        }
    }

    fn close_if_active(&mut self, note_id: &str) {
        if self.active_note_id.as_deref() == Some(note_id) {
            self.active_note_id = None;
            self.history.reset();
        }
    }

    fn commit_tracked(&mut self, before: &Note, after: Note, instant: Instant) {
        self.history.record(before);
        self.save_status.on_edit(instant);
        lifecycle::replace_note(&mut self.notes, after);
    }
}
