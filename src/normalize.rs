use crate::models::{
    new_id, page_title, Note, NoteRecord, Page, Task, TaskRecord, TaskStatus, Timestamp,
};

/// Lifts stored or imported records into the strict note shape. Runs once at the
/// ingest boundary so the rest of the core can rely on the invariants.
pub fn normalize_notes(records: Vec<NoteRecord>, default_category: &str, now: Timestamp) -> Vec<Note> {
    records
        .into_iter()
        .map(|record| normalize_note(record, default_category, now))
        .collect()
}

pub fn normalize_note(record: NoteRecord, default_category: &str, now: Timestamp) -> Note {
    let content = record.content.unwrap_or_default();

    let mut pages: Vec<Page> = record
        .pages
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, page)| Page {
            id: page.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(new_id),
            title: page.title.unwrap_or_else(|| page_title(index + 1)),
            content: page.content,
        })
        .collect();
    if pages.is_empty() {
        pages.push(Page::new(page_title(1), content));
    }
    let content = pages[0].content.clone();
    let active_page_index = record
        .active_page_index
        .unwrap_or(0)
        .min(pages.len() - 1);

    let created_at = record.created_at.or(record.updated_at).unwrap_or(now);
    let updated_at = record.updated_at.unwrap_or(created_at);

    Note {
        id: record.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(new_id),
        title: record.title.unwrap_or_default(),
        content,
        pages,
        active_page_index,
        tasks: record
            .tasks
            .into_iter()
            .map(|task| normalize_task(task, created_at))
            .collect(),
        category: record
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_category.to_string()),
        tags: normalize_tags(record.tags),
        is_archived: record.is_archived.unwrap_or(false),
        created_at,
        updated_at,
    }
}

/// `status` wins when present; otherwise it is derived from the legacy flag.
pub fn normalize_task(record: TaskRecord, fallback_created_at: Timestamp) -> Task {
    let status = record.status.unwrap_or(if record.completed {
        TaskStatus::Completed
    } else {
        TaskStatus::Pending
    });
    Task {
        id: record.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(new_id),
        text: record.text,
        status,
        completed: status == TaskStatus::Completed,
        importance: record.importance,
        created_at: record.created_at.unwrap_or(fallback_created_at),
        due_date: record.due_date,
        reminder_at: record.reminder_at,
        reminder_fired: record.reminder_fired,
    }
}

pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().filter_map(|tag| normalize_tag(tag)) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
