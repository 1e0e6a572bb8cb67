use serde::Deserialize;

use crate::lifecycle::{add_tag, remove_tag, set_category, set_title};
use crate::models::{Note, Timestamp};
use crate::pages::{add_page, close_page, set_page_content, set_page_title, switch_page};

/// One editor action against the open note.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoteEdit {
    SetTitle { title: String },
    SetPageContent { index: usize, content: String },
    SetPageTitle { index: usize, title: String },
    AddTag { tag: String },
    RemoveTag { tag: String },
    AddPage,
    ClosePage { index: usize },
    SwitchPage { index: usize },
    SetCategory { category: String },
}

impl NoteEdit {
    /// Edits that land on the undo stack and drive the save indicator.
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            NoteEdit::SetTitle { .. }
                | NoteEdit::SetPageContent { .. }
                | NoteEdit::SetPageTitle { .. }
                | NoteEdit::AddTag { .. }
                | NoteEdit::RemoveTag { .. }
        )
    }
}

/// Applies `edit` in place. Returns `false` when the note is left unchanged.
pub fn apply_edit(note: &mut Note, edit: &NoteEdit, now: Timestamp) -> bool {
    match edit {
        NoteEdit::SetTitle { title } => set_title(note, title, now),
        NoteEdit::SetPageContent { index, content } => {
            set_page_content(note, *index, content, now)
        }
        NoteEdit::SetPageTitle { index, title } => set_page_title(note, *index, title, now),
        NoteEdit::AddTag { tag } => add_tag(note, tag, now),
        NoteEdit::RemoveTag { tag } => remove_tag(note, tag, now),
        NoteEdit::AddPage => {
            add_page(note, now);
            true
        }
        NoteEdit::ClosePage { index } => close_page(note, *index, now),
        NoteEdit::SwitchPage { index } => switch_page(note, *index, now),
        NoteEdit::SetCategory { category } => set_category(note, category, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CATEGORY;

    #[test]
    fn edits_deserialize_from_tagged_json() {
        let edit: NoteEdit =
            serde_json::from_str(r#"{"type":"set_page_content","index":1,"content":"x"}"#).unwrap();
        assert_eq!(
            edit,
            NoteEdit::SetPageContent {
                index: 1,
                content: "x".to_string()
            }
        );
        let edit: NoteEdit = serde_json::from_str(r#"{"type":"add_page"}"#).unwrap();
        assert_eq!(edit, NoteEdit::AddPage);
    }

    #[test]
    fn only_content_edits_are_tracked() {
        assert!(NoteEdit::SetTitle { title: "t".into() }.is_tracked());
        assert!(NoteEdit::AddTag { tag: "t".into() }.is_tracked());
        assert!(!NoteEdit::SwitchPage { index: 0 }.is_tracked());
        assert!(!NoteEdit::SetCategory { category: "Work".into() }.is_tracked());
    }

    #[test]
    fn apply_reports_no_ops() {
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        assert!(!apply_edit(&mut note, &NoteEdit::ClosePage { index: 0 }, 1));
        assert!(!apply_edit(&mut note, &NoteEdit::SwitchPage { index: 3 }, 1));
        assert!(apply_edit(&mut note, &NoteEdit::AddPage, 2));
        assert!(apply_edit(&mut note, &NoteEdit::SwitchPage { index: 0 }, 3));
        assert_eq!(note.updated_at, 3);
    }

    #[test]
    fn unchanged_values_are_no_ops() {
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        let title = NoteEdit::SetTitle {
            title: "Plan".into(),
        };
        assert!(apply_edit(&mut note, &title, 1));
        assert!(!apply_edit(&mut note, &title, 2));
        let content = NoteEdit::SetPageContent {
            index: 0,
            content: "body".into(),
        };
        assert!(apply_edit(&mut note, &content, 3));
        assert!(!apply_edit(&mut note, &content, 4));
        let page_title = NoteEdit::SetPageTitle {
            index: 0,
            title: "Page 1".into(),
        };
        assert!(!apply_edit(&mut note, &page_title, 5));
        assert_eq!(note.updated_at, 3);
    }
}
