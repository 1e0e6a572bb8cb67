use crate::models::{Note, Settings, Theme, Timestamp};
use crate::normalize::normalize_notes;
use crate::storage::{Storage, StorageError};

#[derive(Debug, Clone, Default)]
pub struct LoadedState {
    pub notes: Vec<Note>,
    pub theme: Theme,
    pub custom_categories: Vec<String>,
    pub settings: Settings,
}

/// Reads every record on its own. A failure on one record falls back to its default
/// and never blocks the others.
pub fn load_all(storage: &Storage, now: Timestamp) -> LoadedState {
    let settings = load_or_default("settings", storage.load_settings().map(|f| f.settings));
    let records = load_or_default("notes", storage.load_notes());
    let notes = normalize_notes(records, &settings.default_category, now);
    let theme = load_or_default("theme", storage.load_theme());
    let custom_categories = load_or_default("categories", storage.load_categories());

    log::info!(
        "state loaded notes={} theme={:?} custom_categories={}",
        notes.len(),
        theme,
        custom_categories.len()
    );

    LoadedState {
        notes,
        theme,
        custom_categories,
        settings,
    }
}

fn load_or_default<T: Default>(record: &str, result: Result<T, StorageError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) if err.is_not_found() => {
            log::debug!("no stored {record} record; using default");
            T::default()
        }
        Err(err) => {
            log::warn!("failed to load {record} record, falling back to default: {err}");
            T::default()
        }
    }
}

/// Full re-serialization of the durable records.
pub fn save_all(
    storage: &Storage,
    notes: &[Note],
    theme: Theme,
    custom_categories: &[String],
) -> Result<(), StorageError> {
    storage.ensure_dirs()?;
    storage.save_notes(notes)?;
    storage.save_theme(theme)?;
    storage.save_categories(custom_categories)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskStatus, DEFAULT_CATEGORY};
    use std::fs;

    #[test]
    fn empty_directory_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_all(&Storage::new(dir.path().to_path_buf()), 1);
        assert!(loaded.notes.is_empty());
        assert_eq!(loaded.theme, Theme::Light);
        assert!(loaded.custom_categories.is_empty());
        assert_eq!(loaded.settings.default_category, DEFAULT_CATEGORY);
    }

    #[test]
    fn corrupted_theme_does_not_block_notes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let mut note = Note::new(DEFAULT_CATEGORY, 1);
        note.title = "kept".to_string();
        storage.save_notes(&[note]).unwrap();
        storage.save_categories(&["Travel".to_string()]).unwrap();
        fs::write(dir.path().join("theme.json"), b"\"not-a-theme\"").unwrap();

        let loaded = load_all(&storage, 2);
        assert_eq!(loaded.notes.len(), 1);
        assert_eq!(loaded.notes[0].title, "kept");
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.custom_categories, vec!["Travel".to_string()]);
    }

    #[test]
    fn corrupted_notes_do_not_block_theme_or_categories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        fs::write(dir.path().join("notes.json"), b"[{broken").unwrap();
        storage.save_theme(Theme::Forest).unwrap();
        storage.save_categories(&["Travel".to_string()]).unwrap();

        let loaded = load_all(&storage, 2);
        assert!(loaded.notes.is_empty());
        assert_eq!(loaded.theme, Theme::Forest);
        assert_eq!(loaded.custom_categories.len(), 1);
    }

    #[test]
    fn legacy_records_are_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("notes.json"),
            br#"[{"id":"n1","title":"Old","content":"body","tasks":[{"id":"t1","text":"x","completed":true}]}]"#,
        )
        .unwrap();
        let loaded = load_all(&Storage::new(dir.path().to_path_buf()), 3);
        let note = &loaded.notes[0];
        assert_eq!(note.pages.len(), 1);
        assert_eq!(note.pages[0].content, "body");
        assert_eq!(note.tasks[0].status, TaskStatus::Completed);
        assert!(note.tasks[0].completed);
    }

    #[test]
    fn save_all_writes_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        save_all(&storage, &[Note::new(DEFAULT_CATEGORY, 1)], Theme::Rose, &[]).unwrap();
        let loaded = load_all(&storage, 2);
        assert_eq!(loaded.notes.len(), 1);
        assert_eq!(loaded.theme, Theme::Rose);
    }
}
