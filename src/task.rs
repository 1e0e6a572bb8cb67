use std::collections::HashSet;

use crate::models::{new_id, Importance, SuggestedTask, Task, TaskStatus, Timestamp};

const CRITICAL_WORDS: &[&str] = &[
    "urgent",
    "asap",
    "critical",
    "emergency",
    "immediately",
    "instant",
];
const HIGH_WORDS: &[&str] = &["important", "priority", "high", "must", "vital"];
const MEDIUM_WORDS: &[&str] = &["medium", "normal", "moderate", "soon", "should"];
const LOW_WORDS: &[&str] = &[
    "low",
    "someday",
    "maybe",
    "eventually",
    "later",
    "whenever",
    "optional",
];

/// Returns `None` for blank text; callers treat that as "nothing to add".
pub fn create_task(
    text: &str,
    importance: Importance,
    due_date: Option<Timestamp>,
    now: Timestamp,
) -> Option<Task> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Task {
        id: new_id(),
        text: text.to_string(),
        status: TaskStatus::Pending,
        completed: false,
        importance: Some(importance),
        created_at: now,
        due_date,
        reminder_at: None,
        reminder_fired: false,
    })
}

impl Task {
    /// Moves between `Pending` and a terminal status. Terminal statuses only reset
    /// back to `Pending`; a direct hop between two of them is refused.
    pub fn set_status(&mut self, status: TaskStatus) -> bool {
        if self.status != status
            && self.status != TaskStatus::Pending
            && status != TaskStatus::Pending
        {
            return false;
        }
        self.status = status;
        self.completed = status == TaskStatus::Completed;
        true
    }
}

/// Idempotent: removing an unknown id is not an error.
pub fn remove_task(tasks: &mut Vec<Task>, task_id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|task| task.id != task_id);
    tasks.len() != before
}

/// Keyword-based importance suggestion for the task entry field. The first tier with
/// a whole-word hit wins.
pub fn detect_importance(text: &str) -> Option<Importance> {
    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect();

    let tiers: [(&[&str], Importance); 4] = [
        (CRITICAL_WORDS, Importance::Critical),
        (HIGH_WORDS, Importance::High),
        (MEDIUM_WORDS, Importance::Medium),
        (LOW_WORDS, Importance::Low),
    ];
    tiers
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| words.contains(*k)))
        .map(|(_, importance)| *importance)
}

/// Appends suggested tasks whose text is not already present (case-insensitive).
/// Returns the number of tasks added.
pub fn merge_suggested_tasks(
    tasks: &mut Vec<Task>,
    suggestions: &[SuggestedTask],
    now: Timestamp,
) -> usize {
    let mut seen: HashSet<String> = tasks
        .iter()
        .map(|task| task.text.trim().to_lowercase())
        .collect();
    let mut added = 0;
    for suggestion in suggestions {
        let key = suggestion.text.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        if let Some(task) = create_task(&suggestion.text, suggestion.importance, None, now + added as i64) {
            tasks.push(task);
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str) -> Task {
        create_task(text, Importance::Medium, None, 1).expect("non-empty text")
    }

    #[test]
    fn create_rejects_blank_text() {
        assert!(create_task("   ", Importance::High, None, 1).is_none());
        assert!(create_task("", Importance::High, None, 1).is_none());
    }

    #[test]
    fn create_starts_pending_with_trimmed_text() {
        let t = create_task("  write report ", Importance::High, Some(99), 5).unwrap();
        assert_eq!(t.text, "write report");
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(!t.completed);
        assert_eq!(t.importance, Some(Importance::High));
        assert_eq!(t.created_at, 5);
        assert_eq!(t.due_date, Some(99));
    }

    #[test]
    fn completed_mirror_tracks_every_status_change() {
        let mut t = task("a");
        for status in [
            TaskStatus::Completed,
            TaskStatus::Pending,
            TaskStatus::Dropped,
            TaskStatus::Pending,
            TaskStatus::Cancelled,
            TaskStatus::Pending,
        ] {
            assert!(t.set_status(status));
            assert_eq!(t.completed, t.status == TaskStatus::Completed);
        }
    }

    #[test]
    fn terminal_statuses_do_not_hop_directly() {
        let mut t = task("a");
        assert!(t.set_status(TaskStatus::Completed));
        assert!(!t.set_status(TaskStatus::Dropped));
        assert_eq!(t.status, TaskStatus::Completed);
        assert!(t.completed);
        // Re-applying the same status is allowed.
        assert!(t.set_status(TaskStatus::Completed));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut tasks = vec![task("a"), task("b")];
        let id = tasks[0].id.clone();
        assert!(remove_task(&mut tasks, &id));
        assert!(!remove_task(&mut tasks, &id));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn detects_importance_by_tier_precedence() {
        assert_eq!(detect_importance("URGENT: call back"), Some(Importance::Critical));
        assert_eq!(detect_importance("someday maybe"), Some(Importance::Low));
        assert_eq!(detect_importance("hello world"), None);
        assert_eq!(
            detect_importance("important but maybe later"),
            Some(Importance::High)
        );
        assert_eq!(
            detect_importance("low priority, fix asap"),
            Some(Importance::Critical)
        );
    }

    #[test]
    fn detection_matches_whole_words_only() {
        assert_eq!(detect_importance("highway trip"), None);
        assert_eq!(detect_importance("mustard"), None);
        assert_eq!(detect_importance("must-have"), Some(Importance::High));
    }

    #[test]
    fn merge_drops_case_insensitive_duplicates() {
        let mut tasks = vec![task("Buy milk")];
        let suggestions = vec![
            SuggestedTask {
                text: "buy MILK".to_string(),
                importance: Importance::High,
            },
            SuggestedTask {
                text: "Call mom".to_string(),
                importance: Importance::Low,
            },
            SuggestedTask {
                text: "call mom ".to_string(),
                importance: Importance::Low,
            },
        ];
        let added = merge_suggested_tasks(&mut tasks, &suggestions, 10);
        assert_eq!(added, 1);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "Call mom");
        assert_eq!(tasks[1].importance, Some(Importance::Low));
    }
}
