use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Note, NoteRecord, SettingsFile, Theme};

const NOTES_FILE: &str = "notes.json";
const THEME_FILE: &str = "theme.json";
const CATEGORIES_FILE: &str = "categories.json";
const SETTINGS_FILE: &str = "settings.json";
pub const EXPORT_DIR: &str = "exports";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

/// Keyed JSON records under the app data directory, one file per key.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(EXPORT_DIR))?;
        Ok(())
    }

    pub fn load_notes(&self) -> Result<Vec<NoteRecord>, StorageError> {
        self.load_json(self.root.join(NOTES_FILE))
    }

    pub fn load_theme(&self) -> Result<Theme, StorageError> {
        self.load_json(self.root.join(THEME_FILE))
    }

    pub fn load_categories(&self) -> Result<Vec<String>, StorageError> {
        self.load_json(self.root.join(CATEGORIES_FILE))
    }

    pub fn load_settings(&self) -> Result<SettingsFile, StorageError> {
        self.load_json(self.root.join(SETTINGS_FILE))
    }

    pub fn save_notes(&self, notes: &[Note]) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(NOTES_FILE), &notes)
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(THEME_FILE), &theme)
    }

    pub fn save_categories(&self, categories: &[String]) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(CATEGORIES_FILE), &categories)
    }

    pub fn save_settings(&self, data: &SettingsFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(SETTINGS_FILE), data)
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(data)?;
        write_atomic_bytes(&path, &json)
    }
}

pub fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Settings, DEFAULT_CATEGORY};

    #[test]
    fn missing_files_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let err = storage.load_notes().expect_err("no notes file yet");
        assert!(err.is_not_found());
        assert!(storage.load_theme().unwrap_err().is_not_found());
    }

    #[test]
    fn records_are_written_and_read_back_independently() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        let mut note = Note::new(DEFAULT_CATEGORY, 1);
        note.title = "hello".to_string();
        storage.save_notes(&[note.clone()]).unwrap();
        storage.save_theme(Theme::Ocean).unwrap();
        storage
            .save_categories(&["Recipes".to_string()])
            .unwrap();
        storage
            .save_settings(&SettingsFile {
                schema_version: 1,
                settings: Settings::default(),
            })
            .unwrap();

        let notes = storage.load_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title.as_deref(), Some("hello"));
        assert_eq!(storage.load_theme().unwrap(), Theme::Ocean);
        assert_eq!(storage.load_categories().unwrap(), vec!["Recipes".to_string()]);
        assert_eq!(storage.load_settings().unwrap().schema_version, 1);
        assert!(dir.path().join(EXPORT_DIR).is_dir());
        assert!(!dir.path().join("notes.tmp").exists());
    }

    #[test]
    fn notes_file_is_a_plain_array() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.save_notes(&[Note::new(DEFAULT_CATEGORY, 1)]).unwrap();
        let raw = fs::read_to_string(dir.path().join("notes.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn corrupt_record_reports_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("theme.json"), b"{not json").unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let err = storage.load_theme().unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
        assert!(!err.is_not_found());
    }
}
