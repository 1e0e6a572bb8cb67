use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{
    new_id, page_title, Note, NoteRecord, Page, Task, Timestamp, IMPORTED_TAG,
};
use crate::normalize::normalize_notes;
use crate::storage::{write_atomic_bytes, StorageError, EXPORT_DIR};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }
}

#[derive(Debug)]
pub enum ImportError {
    Empty,
    Json(serde_json::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Empty => write!(f, "import file is empty"),
            ImportError::Json(err) => write!(f, "invalid note file: {err}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        ImportError::Json(value)
    }
}

fn format_timestamp(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn format_date(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn task_line(task: &Task) -> String {
    let importance = task.importance.map(|i| i.as_str()).unwrap_or("none");
    let mut line = format!("- [{}] {} ({importance})", task.status.as_str(), task.text);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" [Due: {}]", format_date(due)));
    }
    line
}

fn body(note: &Note) -> String {
    note.pages
        .iter()
        .map(|p| p.content.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn task_block(note: &Note) -> String {
    let ordered = crate::ordering::order_tasks(&note.tasks, crate::ordering::TaskFilter::All);
    ordered.iter().map(task_line).collect::<Vec<_>>().join("\n")
}

pub fn render(note: &Note, format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(note),
        ExportFormat::Markdown => Ok(render_markdown(note)),
        ExportFormat::Text => Ok(render_text(note)),
    }
}

fn render_markdown(note: &Note) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("title: {}\n", note.title));
    out.push_str(&format!("category: {}\n", note.category));
    out.push_str(&format!("tags: [{}]\n", note.tags.join(", ")));
    out.push_str(&format!("updated: {}\n", format_timestamp(note.updated_at)));
    out.push_str("---\n\n");
    out.push_str(&body(note));
    out.push('\n');
    if !note.tasks.is_empty() {
        out.push_str("\n## Tasks\n\n");
        out.push_str(&task_block(note));
        out.push('\n');
    }
    out
}

fn render_text(note: &Note) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", note.title));
    out.push_str(&format!("Category: {}\n", note.category));
    out.push_str(&format!("Tags: {}\n", note.tags.join(", ")));
    out.push_str(&format!("Updated: {}\n", format_timestamp(note.updated_at)));
    out.push_str("========================================\n\n");
    out.push_str(&body(note));
    out.push('\n');
    if !note.tasks.is_empty() {
        out.push_str("\nTasks:\n");
        out.push_str(&task_block(note));
        out.push('\n');
    }
    out
}

fn slug(title: &str) -> String {
    let slug = title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "note".to_string()
    } else {
        slug
    }
}

pub fn export_path(root: &Path, note: &Note, format: ExportFormat, now: Timestamp) -> PathBuf {
    let stamp = DateTime::<Utc>::from_timestamp_millis(now)
        .map(|dt| dt.format("%Y%m%d-%H%M%S").to_string())
        .unwrap_or_else(|| now.to_string());
    root.join(EXPORT_DIR).join(format!(
        "{}-{stamp}.{}",
        slug(&note.title),
        format.extension()
    ))
}

pub fn export_note(
    root: &Path,
    note: &Note,
    format: ExportFormat,
    now: Timestamp,
) -> Result<PathBuf, StorageError> {
    let path = export_path(root, note, format, now);
    let text = render(note, format)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_atomic_bytes(&path, text.as_bytes())?;
    Ok(path)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Many(Vec<NoteRecord>),
    One(Box<NoteRecord>),
}

/// Structured input (a note or an array of notes) is taken as-is; anything else
/// becomes a single-page note tagged `imported`. Structured input that fails to
/// parse rejects the whole import.
pub fn parse_import(
    text: &str,
    file_name: Option<&str>,
    default_category: &str,
    now: Timestamp,
) -> Result<Vec<Note>, ImportError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ImportError::Empty);
    }

    let is_json_name = file_name
        .map(|name| name.to_lowercase().ends_with(".json"))
        .unwrap_or(false);
    if is_json_name || trimmed.starts_with('{') || trimmed.starts_with('[') {
        let records = match serde_json::from_str::<ImportPayload>(trimmed)? {
            ImportPayload::Many(records) => records,
            ImportPayload::One(record) => vec![*record],
        };
        return Ok(normalize_notes(records, default_category, now));
    }

    let title = file_name
        .map(|name| {
            Path::new(name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default()
        })
        .filter(|stem| !stem.trim().is_empty())
        .or_else(|| {
            trimmed
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(|line| line.trim_start_matches('#').trim().to_string())
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Imported note".to_string());

    let mut note = Note::new(default_category, now);
    note.title = title;
    note.pages = vec![Page::new(page_title(1), text)];
    note.content = text.to_string();
    note.tags = vec![IMPORTED_TAG.to_string()];
    Ok(vec![note])
}

/// Imported notes keep their ids unless they collide with an existing note.
pub fn dedupe_ids(existing: &[Note], imported: &mut [Note]) {
    let mut taken: HashSet<String> = existing.iter().map(|n| n.id.clone()).collect();
    for note in imported.iter_mut() {
        if !taken.insert(note.id.clone()) {
            note.id = new_id();
            taken.insert(note.id.clone());
        }
    }
}
