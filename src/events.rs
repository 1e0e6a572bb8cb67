use crate::models::{Note, Task, Theme};
use crate::save_status::SaveStatus;

pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_SAVE_STATUS: &str = "save_status_changed";
pub const EVENT_REMINDER: &str = "reminder_fired";

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatePayload {
    pub notes: Vec<Note>,
    pub theme: Theme,
    pub custom_categories: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, PartialEq)]
pub struct DueReminder {
    pub note_id: String,
    pub note_title: String,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SaveStatusPayload {
    pub status: SaveStatus,
}
