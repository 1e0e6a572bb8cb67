use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::editor::NoteEdit;
use crate::events::StatePayload;
#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
use crate::export::{self, ExportFormat};
use crate::lifecycle::{self, DeleteOutcome};
use crate::models::{AnalysisResult, Importance, Note, Settings, Task, TaskStatus, Theme, Timestamp};
use crate::ordering::{order_tasks, TaskFilter};
use crate::persistence::{load_all, save_all};
use crate::state::{AppState, HistoryState};
use crate::storage::{Storage, StorageError};
use crate::task::{create_task, detect_importance, remove_task};

#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnalysisReport {
    pub analysis: AnalysisResult,
    pub added_tasks: usize,
}

trait CommandCtx {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn now_ms() -> Timestamp {
    Utc::now().timestamp_millis()
}

fn instant_now() -> tokio::time::Instant {
    tokio::time::Instant::now()
}

/// Writes notes, theme and categories. Nothing is written until the initial load
/// has completed, so defaults never clobber data that has not been read yet.
fn persist(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    if !state.is_loaded() {
        log::debug!("persist skipped: state not loaded yet");
        return Ok(());
    }
    let storage = Storage::new(ctx.app_data_dir()?);
    let _write = state.write_guard();
    let payload = state.payload();
    save_all(
        &storage,
        &payload.notes,
        payload.theme,
        &payload.custom_categories,
    )?;
    ctx.emit_state_updated(payload);
    Ok(())
}

fn persist_or_err<T>(ctx: &impl CommandCtx, state: &AppState, data: T) -> CommandResult<T> {
    match persist(ctx, state) {
        Ok(()) => ok(data),
        Err(error) => {
            log::error!("persist failed: {error}");
            err(&format!("storage error: {error}"))
        }
    }
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a, R: Runtime> {
    app: &'a AppHandle<R>,
}

#[cfg(all(feature = "app", not(test)))]
impl<R: Runtime> CommandCtx for TauriCommandCtx<'_, R> {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
        self.app
            .path()
            .app_data_dir()
            .map_err(|err| StorageError::Io(std::io::Error::other(err.to_string())))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }
}

#[cfg(all(feature = "app", not(test)))]
pub(crate) fn persist_from_app<R: Runtime>(app: &AppHandle<R>, state: &AppState) {
    let ctx = TauriCommandCtx { app };
    if let Err(error) = persist(&ctx, state) {
        log::error!("background persist failed: {error}");
    }
}

fn load_state_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<StatePayload> {
    if state.is_loaded() {
        return ok(state.payload());
    }
    let root = match ctx.app_data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("app_data_dir error: {e}")),
    };
    let storage = Storage::new(root);
    if let Err(error) = storage.ensure_dirs() {
        return err(&format!("storage error: {error}"));
    }
    state.hydrate(load_all(&storage, now_ms()));
    ok(state.payload())
}

fn update_settings_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    settings: Settings,
) -> CommandResult<Settings> {
    let mut settings = settings;
    settings.default_category = settings.default_category.trim().to_string();
    if settings.default_category.is_empty() {
        return err("default category must not be empty");
    }
    if !state.is_loaded() {
        return err("state not loaded");
    }
    state.update_settings(settings);
    let root = match ctx.app_data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("app_data_dir error: {e}")),
    };
    let _write = state.write_guard();
    if let Err(error) = Storage::new(root).save_settings(&state.settings_file()) {
        return err(&format!("storage error: {error}"));
    }
    ok(state.settings())
}

fn set_theme_impl(ctx: &impl CommandCtx, state: &AppState, theme: Theme) -> CommandResult<Theme> {
    state.set_theme(theme);
    persist_or_err(ctx, state, theme)
}

fn create_note_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<Note> {
    let note = state.create_note(now_ms());
    persist_or_err(ctx, state, note)
}

fn open_note_impl(state: &AppState, note_id: String) -> CommandResult<Note> {
    match state.open_note(&note_id) {
        Some(note) => ok(note),
        None => err("note not found"),
    }
}

fn edit_note_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    edit: NoteEdit,
) -> CommandResult<Note> {
    match state.edit_note(&note_id, &edit, now_ms(), instant_now()) {
        Some((note, true)) => persist_or_err(ctx, state, note),
        Some((note, false)) => ok(note),
        None => err("note not found"),
    }
}

fn undo_impl(ctx: &impl CommandCtx, state: &AppState, note_id: String) -> CommandResult<Note> {
    match state.undo(&note_id, now_ms(), instant_now()) {
        Some(note) => persist_or_err(ctx, state, note),
        None => err("nothing to undo"),
    }
}

fn redo_impl(ctx: &impl CommandCtx, state: &AppState, note_id: String) -> CommandResult<Note> {
    match state.redo(&note_id, now_ms(), instant_now()) {
        Some(note) => persist_or_err(ctx, state, note),
        None => err("nothing to redo"),
    }
}

fn delete_note_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
) -> CommandResult<DeleteOutcome> {
    match state.delete_note(&note_id, now_ms()) {
        DeleteOutcome::NotFound => err("note not found"),
        outcome => persist_or_err(ctx, state, outcome),
    }
}

fn restore_note_impl(ctx: &impl CommandCtx, state: &AppState, note_id: String) -> CommandResult<bool> {
    if !state.restore_note(&note_id, now_ms()) {
        return err("archived note not found");
    }
    persist_or_err(ctx, state, true)
}

fn purge_note_impl(ctx: &impl CommandCtx, state: &AppState, note_id: String) -> CommandResult<bool> {
    if !state.purge_note(&note_id) {
        return err("note not found");
    }
    persist_or_err(ctx, state, true)
}

fn empty_vault_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<usize> {
    let removed = state.empty_vault();
    persist_or_err(ctx, state, removed)
}

fn list_notes_impl(state: &AppState, archived: bool) -> CommandResult<Vec<Note>> {
    let notes = state.notes();
    ok(lifecycle::recent_notes(&notes, archived)
        .into_iter()
        .cloned()
        .collect())
}

/// Runs `f` against one task of one note, then persists. A rejected change leaves
/// the note untouched.
fn with_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: &str,
    task_id: &str,
    f: impl FnOnce(&mut Task) -> Result<(), &'static str>,
) -> CommandResult<Task> {
    let outcome = state.update_tasks(note_id, now_ms(), |tasks| {
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return (Err("task not found"), false);
        };
        match f(task) {
            Ok(()) => (Ok(task.clone()), true),
            Err(message) => (Err(message), false),
        }
    });
    match outcome {
        None => err("note not found"),
        Some(Err(message)) => err(message),
        Some(Ok(task)) => persist_or_err(ctx, state, task),
    }
}

fn add_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    text: String,
    importance: Option<Importance>,
    due_date: Option<Timestamp>,
) -> CommandResult<Task> {
    let importance = importance
        .or_else(|| detect_importance(&text))
        .unwrap_or_default();
    let Some(task) = create_task(&text, importance, due_date, now_ms()) else {
        return err("task text must not be empty");
    };
    let added = state.update_tasks(&note_id, task.created_at, |tasks| {
        tasks.push(task.clone());
        ((), true)
    });
    if added.is_none() {
        return err("note not found");
    }
    persist_or_err(ctx, state, task)
}

fn set_task_status_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
    status: TaskStatus,
) -> CommandResult<Task> {
    with_task(ctx, state, &note_id, &task_id, |task| {
        if task.set_status(status) {
            Ok(())
        } else {
            Err("invalid status transition")
        }
    })
}

fn update_task_text_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
    text: String,
) -> CommandResult<Task> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return err("task text must not be empty");
    }
    with_task(ctx, state, &note_id, &task_id, |task| {
        task.text = text;
        Ok(())
    })
}

fn set_task_importance_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
    importance: Option<Importance>,
) -> CommandResult<Task> {
    with_task(ctx, state, &note_id, &task_id, |task| {
        task.importance = importance;
        Ok(())
    })
}

fn set_due_date_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
    due_date: Option<Timestamp>,
) -> CommandResult<Task> {
    with_task(ctx, state, &note_id, &task_id, |task| {
        task.due_date = due_date;
        Ok(())
    })
}

/// Setting or clearing a reminder re-arms it.
fn set_reminder_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
    reminder_at: Option<Timestamp>,
) -> CommandResult<Task> {
    with_task(ctx, state, &note_id, &task_id, |task| {
        task.reminder_at = reminder_at;
        task.reminder_fired = false;
        Ok(())
    })
}

fn delete_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    task_id: String,
) -> CommandResult<bool> {
    let outcome = state.update_tasks(&note_id, now_ms(), |tasks| {
        let removed = remove_task(tasks, &task_id);
        (removed, removed)
    });
    match outcome {
        None => err("note not found"),
        Some(false) => ok(false),
        Some(true) => persist_or_err(ctx, state, true),
    }
}

fn list_tasks_impl(state: &AppState, note_id: String, filter: TaskFilter) -> CommandResult<Vec<Task>> {
    match state.note(&note_id) {
        Some(note) => ok(order_tasks(&note.tasks, filter)),
        None => err("note not found"),
    }
}

fn detect_importance_impl(text: String) -> CommandResult<Option<Importance>> {
    ok(detect_importance(&text))
}

fn list_categories_impl(state: &AppState) -> CommandResult<Vec<String>> {
    ok(lifecycle::all_categories(&state.custom_categories()))
}

fn add_category_impl(ctx: &impl CommandCtx, state: &AppState, name: String) -> CommandResult<Vec<String>> {
    if !state.add_custom_category(&name) {
        return err("category already exists or is empty");
    }
    persist_or_err(ctx, state, lifecycle::all_categories(&state.custom_categories()))
}

fn remove_category_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    name: String,
) -> CommandResult<Vec<String>> {
    if !state.remove_custom_category(&name, now_ms()) {
        return err("custom category not found");
    }
    persist_or_err(ctx, state, lifecycle::all_categories(&state.custom_categories()))
}

fn export_note_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    format: ExportFormat,
) -> CommandResult<String> {
    let root = match ctx.app_data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("app_data_dir error: {e}")),
    };
    let Some(note) = state.note(&note_id) else {
        return err("note not found");
    };
    match export::export_note(&root, &note, format, now_ms()) {
        Ok(path) => {
            log::info!("note exported path={}", path.display());
            ok(path.to_string_lossy().to_string())
        }
        Err(error) => err(&format!("export error: {error}")),
    }
}

/// Reads and parses the whole file before touching state; a failed parse imports
/// nothing.
fn import_file_impl(ctx: &impl CommandCtx, state: &AppState, path: String) -> CommandResult<Vec<Note>> {
    let path = Path::new(&path);
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => return err(&format!("import error: {error}")),
    };
    let file_name = path.file_name().map(|name| name.to_string_lossy().to_string());
    let default_category = state.settings().default_category;
    let mut notes = match export::parse_import(&text, file_name.as_deref(), &default_category, now_ms()) {
        Ok(notes) => notes,
        Err(error) => {
            log::warn!("import rejected path={} error={error}", path.display());
            return err(&format!("import error: {error}"));
        }
    };
    export::dedupe_ids(&state.notes(), &mut notes);
    let count = state.import_notes(notes.clone());
    log::info!("notes imported count={count}");
    persist_or_err(ctx, state, notes)
}

fn history_state_impl(state: &AppState) -> CommandResult<HistoryState> {
    ok(state.history_state())
}

/// `None` means no analysis was available (no key configured, or the service
/// failed); the note is left alone and the call still succeeds.
fn apply_analysis_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    note_id: String,
    analysis: Option<AnalysisResult>,
) -> CommandResult<Option<AnalysisReport>> {
    let Some(analysis) = analysis else {
        return ok(None);
    };
    match state.apply_analysis(&note_id, &analysis, now_ms()) {
        None => err("note not found"),
        Some(added_tasks) => persist_or_err(
            ctx,
            state,
            Some(AnalysisReport {
                analysis,
                added_tasks,
            }),
        ),
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(app: AppHandle, state: State<AppState>) -> CommandResult<StatePayload> {
    let ctx = TauriCommandCtx { app: &app };
    load_state_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_settings(
    app: AppHandle,
    state: State<AppState>,
    settings: Settings,
) -> CommandResult<Settings> {
    let ctx = TauriCommandCtx { app: &app };
    update_settings_impl(&ctx, state.inner(), settings)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_theme(app: AppHandle, state: State<AppState>, theme: Theme) -> CommandResult<Theme> {
    let ctx = TauriCommandCtx { app: &app };
    set_theme_impl(&ctx, state.inner(), theme)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_note(app: AppHandle, state: State<AppState>) -> CommandResult<Note> {
    let ctx = TauriCommandCtx { app: &app };
    create_note_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn open_note(state: State<AppState>, note_id: String) -> CommandResult<Note> {
    open_note_impl(state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn edit_note(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    edit: NoteEdit,
) -> CommandResult<Note> {
    let ctx = TauriCommandCtx { app: &app };
    edit_note_impl(&ctx, state.inner(), note_id, edit)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn undo(app: AppHandle, state: State<AppState>, note_id: String) -> CommandResult<Note> {
    let ctx = TauriCommandCtx { app: &app };
    undo_impl(&ctx, state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn redo(app: AppHandle, state: State<AppState>, note_id: String) -> CommandResult<Note> {
    let ctx = TauriCommandCtx { app: &app };
    redo_impl(&ctx, state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_note(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
) -> CommandResult<DeleteOutcome> {
    let ctx = TauriCommandCtx { app: &app };
    delete_note_impl(&ctx, state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn restore_note(app: AppHandle, state: State<AppState>, note_id: String) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    restore_note_impl(&ctx, state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn purge_note(app: AppHandle, state: State<AppState>, note_id: String) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    purge_note_impl(&ctx, state.inner(), note_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn empty_vault(app: AppHandle, state: State<AppState>) -> CommandResult<usize> {
    let ctx = TauriCommandCtx { app: &app };
    empty_vault_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn list_notes(state: State<AppState>, archived: bool) -> CommandResult<Vec<Note>> {
    list_notes_impl(state.inner(), archived)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn add_task(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    text: String,
    importance: Option<Importance>,
    due_date: Option<Timestamp>,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    add_task_impl(&ctx, state.inner(), note_id, text, importance, due_date)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_task_status(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
    status: TaskStatus,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    set_task_status_impl(&ctx, state.inner(), note_id, task_id, status)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_task_text(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
    text: String,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    update_task_text_impl(&ctx, state.inner(), note_id, task_id, text)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_task_importance(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
    importance: Option<Importance>,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    set_task_importance_impl(&ctx, state.inner(), note_id, task_id, importance)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_due_date(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
    due_date: Option<Timestamp>,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    set_due_date_impl(&ctx, state.inner(), note_id, task_id, due_date)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_reminder(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
    reminder_at: Option<Timestamp>,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    set_reminder_impl(&ctx, state.inner(), note_id, task_id, reminder_at)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_task(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    task_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    delete_task_impl(&ctx, state.inner(), note_id, task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn list_tasks(
    state: State<AppState>,
    note_id: String,
    filter: Option<TaskFilter>,
) -> CommandResult<Vec<Task>> {
    list_tasks_impl(state.inner(), note_id, filter.unwrap_or_default())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn suggest_importance(text: String) -> CommandResult<Option<Importance>> {
    detect_importance_impl(text)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn list_categories(state: State<AppState>) -> CommandResult<Vec<String>> {
    list_categories_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn add_category(
    app: AppHandle,
    state: State<AppState>,
    name: String,
) -> CommandResult<Vec<String>> {
    let ctx = TauriCommandCtx { app: &app };
    add_category_impl(&ctx, state.inner(), name)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn remove_category(
    app: AppHandle,
    state: State<AppState>,
    name: String,
) -> CommandResult<Vec<String>> {
    let ctx = TauriCommandCtx { app: &app };
    remove_category_impl(&ctx, state.inner(), name)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn export_note(
    app: AppHandle,
    state: State<AppState>,
    note_id: String,
    format: ExportFormat,
) -> CommandResult<String> {
    let ctx = TauriCommandCtx { app: &app };
    export_note_impl(&ctx, state.inner(), note_id, format)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn import_file(app: AppHandle, state: State<AppState>, path: String) -> CommandResult<Vec<Note>> {
    let ctx = TauriCommandCtx { app: &app };
    import_file_impl(&ctx, state.inner(), path)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn history_state(state: State<AppState>) -> CommandResult<HistoryState> {
    history_state_impl(state.inner())
}

/// The request runs without holding the state lock; the result merges into the
/// note as it is when the response arrives.
#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn analyze_note(
    app: AppHandle,
    state: State<'_, AppState>,
    note_id: String,
) -> Result<CommandResult<Option<AnalysisReport>>, String> {
    let state = state.inner().clone();
    let Some(note) = state.note(&note_id) else {
        return Ok(err("note not found"));
    };
    let settings = state.settings();
    let content = crate::ai::analysis_input(&note);
    let analysis = crate::ai::analyze(&settings, &content).await;
    let ctx = TauriCommandCtx { app: &app };
    Ok(apply_analysis_impl(&ctx, &state, note_id, analysis))
}
