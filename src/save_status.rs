use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
}

/// idle -> saving -> saved -> idle, with a single pending deadline. Purely a UI
/// affordance; persistence writes independently of it.
#[derive(Debug)]
pub struct SaveIndicator {
    status: SaveStatus,
    deadline: Option<Instant>,
    debounce: Duration,
    display: Duration,
}

impl SaveIndicator {
    pub fn new(debounce: Duration, display: Duration) -> Self {
        Self {
            status: SaveStatus::Idle,
            deadline: None,
            debounce,
            display,
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn set_delays(&mut self, debounce: Duration, display: Duration) {
        self.debounce = debounce;
        self.display = display;
    }

    /// Any tracked edit restarts the debounce, replacing a pending deadline.
    pub fn on_edit(&mut self, now: Instant) {
        self.status = SaveStatus::Saving;
        self.deadline = Some(now + self.debounce);
    }

    /// Advances the machine if its deadline has passed. Returns the new status when
    /// it changed.
    pub fn poll(&mut self, now: Instant) -> Option<SaveStatus> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        match self.status {
            SaveStatus::Saving => {
                self.status = SaveStatus::Saved;
                self.deadline = Some(now + self.display);
            }
            SaveStatus::Saved => {
                self.status = SaveStatus::Idle;
                self.deadline = None;
            }
            SaveStatus::Idle => {
                self.deadline = None;
                return None;
            }
        }
        Some(self.status)
    }
}

impl Default for SaveIndicator {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(2000))
    }
}
