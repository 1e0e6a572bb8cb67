pub mod ai;
pub mod commands;
pub mod editor;
pub mod events;
pub mod export;
pub mod history;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod ordering;
pub mod pages;
pub mod persistence;
pub mod save_status;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod task;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::start_scheduler;
#[cfg(all(feature = "app", not(test)))]
use crate::state::AppState;
#[cfg(all(feature = "app", not(test)))]
use crate::storage::Storage;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let root = app.path().app_data_dir()?;
            if let Err(error) = logging::init_logging(&root) {
                eprintln!("logger init failed: {error}");
            }

            let storage = Storage::new(root);
            storage.ensure_dirs()?;
            let now = chrono::Utc::now().timestamp_millis();

            let state = AppState::new();
            state.hydrate(persistence::load_all(&storage, now));
            app.manage(state.clone());

            start_scheduler(app.handle().clone(), state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            update_settings,
            set_theme,
            create_note,
            open_note,
            edit_note,
            undo,
            redo,
            history_state,
            delete_note,
            restore_note,
            purge_note,
            empty_vault,
            list_notes,
            add_task,
            set_task_status,
            update_task_text,
            set_task_importance,
            set_due_date,
            set_reminder,
            delete_task,
            list_tasks,
            suggest_importance,
            list_categories,
            add_category,
            remove_category,
            export_note,
            import_file,
            analyze_note,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
