use crate::models::{page_title, Note, Page, Timestamp};

pub fn add_page(note: &mut Note, now: Timestamp) {
    note.pages.push(Page::new(page_title(note.pages.len() + 1), ""));
    note.active_page_index = note.pages.len() - 1;
    note.updated_at = now;
}

/// At least one page always remains; closing the last one (or an unknown index) is
/// a no-op.
pub fn close_page(note: &mut Note, index: usize, now: Timestamp) -> bool {
    if note.pages.len() <= 1 || index >= note.pages.len() {
        return false;
    }
    note.pages.remove(index);
    if index <= note.active_page_index && note.active_page_index > 0 {
        note.active_page_index -= 1;
    }
    note.active_page_index = note.active_page_index.min(note.pages.len() - 1);
    sync_legacy_content(note);
    note.updated_at = now;
    true
}

pub fn switch_page(note: &mut Note, index: usize, now: Timestamp) -> bool {
    if index >= note.pages.len() {
        return false;
    }
    note.active_page_index = index;
    note.updated_at = now;
    true
}

pub fn set_page_content(note: &mut Note, index: usize, content: &str, now: Timestamp) -> bool {
    let Some(page) = note.pages.get_mut(index) else {
        return false;
    };
    if page.content == content {
        return false;
    }
    page.content = content.to_string();
    if index == 0 {
        sync_legacy_content(note);
    }
    note.updated_at = now;
    true
}

pub fn set_page_title(note: &mut Note, index: usize, title: &str, now: Timestamp) -> bool {
    let Some(page) = note.pages.get_mut(index) else {
        return false;
    };
    if page.title == title {
        return false;
    }
    page.title = title.to_string();
    note.updated_at = now;
    true
}

/// Keeps `content` equal to the first page, and the active pointer in bounds.
pub fn sync_legacy_content(note: &mut Note) {
    if note.pages.is_empty() {
        note.pages.push(Page::new(page_title(1), note.content.clone()));
    }
    note.content = note.pages[0].content.clone();
    note.active_page_index = note.active_page_index.min(note.pages.len() - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CATEGORY;

    fn note_with_pages(count: usize) -> Note {
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        for _ in 1..count {
            add_page(&mut note, 0);
        }
        for (i, page) in note.pages.iter_mut().enumerate() {
            page.content = format!("content-{i}");
        }
        sync_legacy_content(&mut note);
        note
    }

    #[test]
    fn add_page_appends_numbered_page_and_activates_it() {
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        add_page(&mut note, 10);
        assert_eq!(note.pages.len(), 2);
        assert_eq!(note.pages[1].title, "Page 2");
        assert_eq!(note.active_page_index, 1);
        assert_eq!(note.updated_at, 10);
        assert_ne!(note.pages[0].id, note.pages[1].id);
    }

    #[test]
    fn closing_the_only_page_is_a_no_op() {
        let mut note = Note::new(DEFAULT_CATEGORY, 0);
        assert!(!close_page(&mut note, 0, 5));
        assert_eq!(note.pages.len(), 1);
        assert_eq!(note.updated_at, 0);
    }

    #[test]
    fn closing_the_active_page_keeps_pointer_in_bounds() {
        let mut note = note_with_pages(3);
        note.active_page_index = 2;
        assert!(close_page(&mut note, 2, 1));
        assert_eq!(note.pages.len(), 2);
        assert_eq!(note.active_page_index, 1);

        note.active_page_index = 0;
        assert!(close_page(&mut note, 0, 2));
        assert_eq!(note.pages.len(), 1);
        assert_eq!(note.active_page_index, 0);
        assert_eq!(note.content, "content-1");
    }

    #[test]
    fn closing_a_page_before_the_active_one_keeps_it_selected() {
        let mut note = note_with_pages(4);
        note.active_page_index = 2;
        let selected = note.pages[2].id.clone();
        assert!(close_page(&mut note, 0, 1));
        assert_eq!(note.pages[note.active_page_index].id, selected);
        assert_eq!(note.content, "content-1");
    }

    #[test]
    fn closing_a_page_after_the_active_one_leaves_pointer_alone() {
        let mut note = note_with_pages(3);
        note.active_page_index = 0;
        assert!(close_page(&mut note, 2, 1));
        assert_eq!(note.active_page_index, 0);
        assert!(!close_page(&mut note, 7, 1));
    }

    #[test]
    fn switch_page_rejects_out_of_range() {
        let mut note = note_with_pages(2);
        assert!(switch_page(&mut note, 0, 3));
        assert_eq!(note.active_page_index, 0);
        assert_eq!(note.updated_at, 3);
        assert!(!switch_page(&mut note, 2, 4));
        assert_eq!(note.active_page_index, 0);
        assert_eq!(note.updated_at, 3);
    }

    #[test]
    fn first_page_content_is_mirrored_into_legacy_field() {
        let mut note = note_with_pages(2);
        assert!(set_page_content(&mut note, 0, "hello", 1));
        assert_eq!(note.content, "hello");
        assert!(set_page_content(&mut note, 1, "second", 2));
        assert_eq!(note.content, "hello");
        assert!(!set_page_content(&mut note, 5, "nope", 3));
        assert!(set_page_title(&mut note, 1, "Notes", 4));
        assert_eq!(note.pages[1].title, "Notes");
        assert_eq!(note.updated_at, 4);
    }
}
