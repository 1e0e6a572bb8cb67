use serde::Serialize;

use crate::models::{Note, Timestamp, DEFAULT_CATEGORIES};
use crate::normalize::normalize_tag;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Archived,
    Purged,
    NotFound,
}

/// New notes go to the front of the collection.
pub fn create_note(notes: &mut Vec<Note>, category: &str, now: Timestamp) -> Note {
    let note = Note::new(category, now);
    notes.insert(0, note.clone());
    note
}

pub fn find_note<'a>(notes: &'a [Note], note_id: &str) -> Option<&'a Note> {
    notes.iter().find(|n| n.id == note_id)
}

pub fn replace_note(notes: &mut [Note], note: Note) -> bool {
    match notes.iter_mut().find(|n| n.id == note.id) {
        Some(existing) => {
            *existing = note;
            true
        }
        None => false,
    }
}

/// Deleting an active note moves it to the vault; deleting an archived note removes it.
pub fn delete_note(notes: &mut Vec<Note>, note_id: &str, now: Timestamp) -> DeleteOutcome {
    let Some(position) = notes.iter().position(|n| n.id == note_id) else {
        return DeleteOutcome::NotFound;
    };
    if notes[position].is_archived {
        notes.remove(position);
        return DeleteOutcome::Purged;
    }
    notes[position].is_archived = true;
    notes[position].updated_at = now;
    DeleteOutcome::Archived
}

pub fn restore_note(notes: &mut [Note], note_id: &str, now: Timestamp) -> bool {
    match notes.iter_mut().find(|n| n.id == note_id && n.is_archived) {
        Some(note) => {
            note.is_archived = false;
            note.updated_at = now;
            true
        }
        None => false,
    }
}

pub fn purge_note(notes: &mut Vec<Note>, note_id: &str) -> bool {
    let before = notes.len();
    notes.retain(|n| n.id != note_id);
    notes.len() != before
}

/// Permanently removes every archived note.
pub fn empty_vault(notes: &mut Vec<Note>) -> usize {
    let before = notes.len();
    notes.retain(|n| !n.is_archived);
    before - notes.len()
}

pub fn recent_notes(notes: &[Note], archived: bool) -> Vec<&Note> {
    let mut out: Vec<&Note> = notes.iter().filter(|n| n.is_archived == archived).collect();
    out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    out
}

pub fn add_tag(note: &mut Note, tag: &str, now: Timestamp) -> bool {
    let Some(tag) = normalize_tag(tag) else {
        return false;
    };
    if note.tags.contains(&tag) {
        return false;
    }
    note.tags.push(tag);
    note.updated_at = now;
    true
}

pub fn remove_tag(note: &mut Note, tag: &str, now: Timestamp) -> bool {
    let Some(tag) = normalize_tag(tag) else {
        return false;
    };
    let before = note.tags.len();
    note.tags.retain(|t| *t != tag);
    if note.tags.len() == before {
        return false;
    }
    note.updated_at = now;
    true
}

pub fn set_title(note: &mut Note, title: &str, now: Timestamp) -> bool {
    if note.title == title {
        return false;
    }
    note.title = title.to_string();
    note.updated_at = now;
    true
}

pub fn set_category(note: &mut Note, category: &str, now: Timestamp) -> bool {
    let category = category.trim();
    if category.is_empty() || note.category == category {
        return false;
    }
    note.category = category.to_string();
    note.updated_at = now;
    true
}

pub fn all_categories(custom: &[String]) -> Vec<String> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .chain(custom.iter().cloned())
        .collect()
}

pub fn add_custom_category(custom: &mut Vec<String>, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    let taken = DEFAULT_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
        || custom.iter().any(|c| c.eq_ignore_ascii_case(name));
    if taken {
        return false;
    }
    custom.push(name.to_string());
    true
}

/// Notes filed under a removed category fall back to `default_category`.
pub fn remove_custom_category(
    custom: &mut Vec<String>,
    notes: &mut [Note],
    name: &str,
    default_category: &str,
    now: Timestamp,
) -> bool {
    let Some(position) = custom.iter().position(|c| c == name) else {
        return false;
    };
    let removed = custom.remove(position);
    for note in notes.iter_mut().filter(|n| n.category == removed) {
        note.category = default_category.to_string();
        note.updated_at = now;
    }
    true
}
