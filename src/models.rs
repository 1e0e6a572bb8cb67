use serde::{Deserialize, Serialize};

/// Unix timestamp in milliseconds.
pub type Timestamp = i64;

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_CATEGORIES: [&str; 4] = ["General", "Work", "Personal", "Ideas"];
pub const IMPORTED_TAG: &str = "imported";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Dropped,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Dropped => "dropped",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Importance {
    pub fn score(&self) -> u8 {
        match self {
            Importance::Low => 1,
            Importance::Medium => 2,
            Importance::High => 3,
            Importance::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
            Importance::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Importance::Low),
            "medium" => Some(Importance::Medium),
            "high" => Some(Importance::High),
            "critical" => Some(Importance::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub status: TaskStatus,
    /// Mirror of `status == Completed`, kept for older readers of the data file.
    pub completed: bool,
    /// `None` only for legacy records that never carried a level.
    pub importance: Option<Importance>,
    pub created_at: Timestamp,
    pub due_date: Option<Timestamp>,
    pub reminder_at: Option<Timestamp>,
    #[serde(default)]
    pub reminder_fired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Page {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            content: content.into(),
        }
    }
}

pub fn page_title(position: usize) -> String {
    format!("Page {position}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Legacy mirror of `pages[0].content`.
    pub content: String,
    pub pages: Vec<Page>,
    pub active_page_index: usize,
    pub tasks: Vec<Task>,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Note {
    pub fn new(category: &str, now: Timestamp) -> Self {
        Self {
            id: new_id(),
            title: String::new(),
            content: String::new(),
            pages: vec![Page::new(page_title(1), "")],
            active_page_index: 0,
            tasks: Vec::new(),
            category: category.to_string(),
            tags: Vec::new(),
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Sepia,
    Ocean,
    Forest,
    Midnight,
    Rose,
}

/// Leniently shaped records as they may appear on disk or in an import file.
/// `normalize` lifts them into the strict model above.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "snake_case")]
pub struct NoteRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub pages: Option<Vec<PageRecord>>,
    pub active_page_index: Option<usize>,
    pub tasks: Vec<TaskRecord>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_archived: Option<bool>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "snake_case")]
pub struct PageRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "snake_case")]
pub struct TaskRecord {
    pub id: Option<String>,
    pub text: String,
    pub status: Option<TaskStatus>,
    pub completed: bool,
    pub importance: Option<Importance>,
    pub created_at: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub reminder_at: Option<Timestamp>,
    pub reminder_fired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SuggestedTask {
    pub text: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisResult {
    pub summary: String,
    pub keywords: Vec<String>,
    pub sentiment: String,
    pub related_concepts: Vec<String>,
    pub suggested_tasks: Vec<SuggestedTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub ai_api_key: String,
    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default = "default_saved_display_ms")]
    pub saved_display_ms: u64,
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_api_key: String::new(),
            ai_base_url: default_ai_base_url(),
            ai_model: default_ai_model(),
            ai_timeout_secs: default_ai_timeout_secs(),
            save_debounce_ms: default_save_debounce_ms(),
            saved_display_ms: default_saved_display_ms(),
            default_category: default_category(),
        }
    }
}

fn default_ai_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_ai_model() -> String {
    "deepseek-chat".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    45
}

fn default_save_debounce_ms() -> u64 {
    1000
}

fn default_saved_display_ms() -> u64 {
    2000
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}
