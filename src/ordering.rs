use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
    Dropped,
    Cancelled,
}

impl TaskFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => status == TaskStatus::Pending,
            TaskFilter::Completed => status == TaskStatus::Completed,
            TaskFilter::Dropped => status == TaskStatus::Dropped,
            TaskFilter::Cancelled => status == TaskStatus::Cancelled,
        }
    }
}

/// Display order for a task list: pending first, then importance, then newest.
/// Never mutates the input.
pub fn order_tasks(tasks: &[Task], filter: TaskFilter) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task.status))
        .cloned()
        .collect();
    out.sort_by(compare_tasks);
    out
}

fn compare_tasks(left: &Task, right: &Task) -> Ordering {
    status_rank(left.status)
        .cmp(&status_rank(right.status))
        .then_with(|| importance_score(right).cmp(&importance_score(left)))
        .then_with(|| right.created_at.cmp(&left.created_at))
}

fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Pending => 0,
        _ => 1,
    }
}

fn importance_score(task: &Task) -> u8 {
    task.importance.map(|i| i.score()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Importance;

    fn make_task(
        id: &str,
        status: TaskStatus,
        importance: Option<Importance>,
        created_at: i64,
    ) -> Task {
        Task {
            id: id.to_string(),
            text: format!("task-{id}"),
            status,
            completed: status == TaskStatus::Completed,
            importance,
            created_at,
            due_date: None,
            reminder_at: None,
            reminder_fired: false,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn all_places_pending_first_then_importance_then_newest() {
        let tasks = vec![
            make_task("done-critical", TaskStatus::Completed, Some(Importance::Critical), 9),
            make_task("low-new", TaskStatus::Pending, Some(Importance::Low), 8),
            make_task("high-old", TaskStatus::Pending, Some(Importance::High), 1),
            make_task("high-new", TaskStatus::Pending, Some(Importance::High), 5),
            make_task("legacy", TaskStatus::Pending, None, 20),
            make_task("dropped-low", TaskStatus::Dropped, Some(Importance::Low), 3),
            make_task("crit", TaskStatus::Pending, Some(Importance::Critical), 2),
        ];
        let ordered = order_tasks(&tasks, TaskFilter::All);
        assert_eq!(
            ids(&ordered),
            vec![
                "crit",
                "high-new",
                "high-old",
                "low-new",
                "legacy",
                "done-critical",
                "dropped-low"
            ]
        );
    }

    #[test]
    fn filter_keeps_only_matching_status() {
        let tasks = vec![
            make_task("a", TaskStatus::Completed, Some(Importance::Low), 1),
            make_task("b", TaskStatus::Pending, Some(Importance::High), 2),
            make_task("c", TaskStatus::Completed, Some(Importance::High), 3),
            make_task("d", TaskStatus::Cancelled, Some(Importance::High), 4),
        ];
        assert_eq!(ids(&order_tasks(&tasks, TaskFilter::Completed)), vec!["c", "a"]);
        assert_eq!(ids(&order_tasks(&tasks, TaskFilter::Pending)), vec!["b"]);
        assert_eq!(ids(&order_tasks(&tasks, TaskFilter::Cancelled)), vec!["d"]);
        assert!(order_tasks(&tasks, TaskFilter::Dropped).is_empty());
    }

    #[test]
    fn input_is_left_untouched() {
        let tasks = vec![
            make_task("old", TaskStatus::Pending, Some(Importance::Low), 1),
            make_task("new", TaskStatus::Pending, Some(Importance::Low), 2),
        ];
        let snapshot = tasks.clone();
        let ordered = order_tasks(&tasks, TaskFilter::All);
        assert_eq!(ids(&ordered), vec!["new", "old"]);
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn filter_serializes_as_lowercase() {
        let filter: TaskFilter = serde_json::from_str("\"dropped\"").unwrap();
        assert_eq!(filter, TaskFilter::Dropped);
    }
}
