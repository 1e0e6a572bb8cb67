use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::save_status::SaveStatus;
use crate::state::AppState;

#[cfg(all(feature = "app", not(test)))]
use crate::events::{SaveStatusPayload, EVENT_REMINDER, EVENT_SAVE_STATUS};
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter};

pub const SAVE_STATUS_TICK: Duration = Duration::from_millis(100);
pub const REMINDER_TICK: Duration = Duration::from_secs(1);

/// Drives the save indicator's deadlines and reports each transition until
/// `on_change` breaks.
pub async fn run_save_status_loop<F>(state: AppState, period: Duration, mut on_change: F)
where
    F: FnMut(SaveStatus) -> ControlFlow<()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if let Some(status) = state.poll_save_status(Instant::now()) {
            if on_change(status).is_break() {
                return;
            }
        }
    }
}

#[cfg(all(feature = "app", not(test)))]
pub fn start_scheduler(app: AppHandle, state: AppState) {
    let status_app = app.clone();
    let status_state = state.clone();
    tauri::async_runtime::spawn(async move {
        run_save_status_loop(status_state, SAVE_STATUS_TICK, |status| {
            let _ = status_app.emit(EVENT_SAVE_STATUS, SaveStatusPayload { status });
            ControlFlow::Continue(())
        })
        .await;
    });

    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(REMINDER_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp_millis();
            let due = state.take_due_reminders(now);
            if due.is_empty() {
                continue;
            }
            log::info!("reminders fired count={}", due.len());
            let _ = app.emit(EVENT_REMINDER, &due);
            crate::commands::persist_from_app(&app, &state);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::NoteEdit;
    use crate::persistence::LoadedState;

    #[tokio::test(start_paused = true)]
    async fn loop_reports_saved_then_idle() {
        let state = AppState::new();
        state.hydrate(LoadedState::default());
        let note = state.create_note(1);
        state.edit_note(
            &note.id,
            &NoteEdit::SetTitle {
                title: "draft".to_string(),
            },
            2,
            Instant::now(),
        );
        assert_eq!(state.save_status(), SaveStatus::Saving);

        let started = Instant::now();
        let mut seen = Vec::new();
        run_save_status_loop(state.clone(), SAVE_STATUS_TICK, |status| {
            seen.push((status, started.elapsed()));
            if status == SaveStatus::Idle {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;

        let statuses: Vec<SaveStatus> = seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(statuses, vec![SaveStatus::Saved, SaveStatus::Idle]);
        assert!(seen[0].1 >= Duration::from_millis(1000));
        assert!(seen[1].1 >= Duration::from_millis(3000));
        assert_eq!(state.save_status(), SaveStatus::Idle);
    }
}
