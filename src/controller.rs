//! Configuration window controller - the composition root
//!
//! Receives UI events from the presentation layer, mutates the selection and
//! save state, recomputes action availability, drives the background task
//! coordinator, and pushes results back through the `ConfigView` trait.
//!
//! Threading contract: every method here runs on the event thread. Workers
//! never call in; they post `TaskEvent`s which the event loop hands to
//! `process_task_events`. That single-writer rule is what keeps "script
//! finished" from racing "user changed selection".

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::actions::{self, ActionAvailability};
use crate::coordinator::{
    BackgroundTaskCoordinator, InputRecorder, RecordOptions, ScriptRunner, TaskEvent,
};
use crate::error::{ConfigError, Result};
use crate::items::Item;
use crate::layout::LayoutPrefs;
use crate::selection::SelectionState;

/// Application-level collaborator, injected at construction. Replaces the
/// process-wide application singleton the window would otherwise reach into.
pub trait AppContext {
    /// Persisted state changed; `persist_global` is supplied by the save
    /// operation and forwarded untouched.
    fn config_altered(&self, persist_global: bool);
    /// Begin application shutdown. Only called after a successful close.
    fn shutdown(&self);
    /// Offer to save unsaved changes. Returns true when the prompt was
    /// shown and handled, which ABORTS the close in progress.
    fn prompt_to_save(&self) -> bool;
    /// Hand the two layout preferences to the settings store.
    fn persist_layout(&self, prefs: &LayoutPrefs);
    /// Toggle the global input-monitoring service.
    fn toggle_monitoring(&self);
    fn monitoring_running(&self) -> bool;
    /// True when the service cannot be toggled at all (e.g. startup failure).
    fn monitoring_locked(&self) -> bool;
}

/// Presentation boundary. Implementations flip widget enablement, toggle
/// buttons, and surface status text; they hold no logic. All calls arrive
/// on the event thread.
pub trait ConfigView {
    fn set_availability(&self, avail: &ActionAvailability);
    fn set_record_active(&self, active: bool);
    fn set_monitoring_checked(&self, checked: bool);
    fn set_monitoring_enabled(&self, enabled: bool);
    fn set_visible(&self, visible: bool);
    fn show_status(&self, message: &str);
    fn show_script_error(&self, message: &str);
}

/// Save lifecycle of the window's item tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveState {
    Clean,
    Dirty,
    Saving,
}

pub struct ConfigWindowController {
    app: Arc<dyn AppContext>,
    view: Arc<dyn ConfigView>,
    coordinator: BackgroundTaskCoordinator,
    task_events: Receiver<TaskEvent>,
    selection: SelectionState,
    save_state: SaveState,
    undo_available: bool,
    redo_available: bool,
    layout: LayoutPrefs,
    last_script_error: Option<String>,
}

impl ConfigWindowController {
    pub fn new(
        app: Arc<dyn AppContext>,
        view: Arc<dyn ConfigView>,
        runner: Arc<dyn ScriptRunner>,
        recorder: Arc<dyn InputRecorder>,
    ) -> Self {
        let (coordinator, task_events) = BackgroundTaskCoordinator::new(runner, recorder);
        Self {
            app,
            view,
            coordinator,
            task_events,
            selection: SelectionState::new(),
            save_state: SaveState::Clean,
            undo_available: false,
            redo_available: false,
            layout: LayoutPrefs::default(),
            last_script_error: None,
        }
    }

    /// Shrink the script settling delay. Tests pass `Duration::ZERO`.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.coordinator.set_settle_delay(delay);
        self
    }

    /// Seed the view's stateful toggles once the window is built. Trivial
    /// constant states live in the presentation layer; only run-time state
    /// belongs here.
    pub fn init_action_states(&self) {
        self.view
            .set_monitoring_checked(self.app.monitoring_running());
        self.view
            .set_monitoring_enabled(!self.app.monitoring_locked());
        self.view.set_availability(&self.availability());
    }

    // ---- Selection and availability ----

    /// The tree selection changed. `changed == true` means the change came
    /// with a destructive structural edit that invalidated the undo/redo
    /// stack, so save/undo/redo are force-disabled regardless of prior
    /// state. Returns the recomputed availability after pushing it to the
    /// view.
    pub fn on_selection_changed(&mut self, items: Vec<Item>, changed: bool) -> ActionAvailability {
        debug!(selected = items.len(), changed, "Selection changed");
        self.selection.items = items;
        if changed {
            self.save_state = SaveState::Clean;
            self.selection.dirty = false;
            self.undo_available = false;
            self.redo_available = false;
        }
        self.push_availability()
    }

    /// Items available to paste changed (cut/copy performed in the tree).
    pub fn set_clipboard_count(&mut self, count: usize) {
        self.selection.clipboard_count = count;
        self.push_availability();
    }

    /// Current availability snapshot: pure resolver output plus the
    /// undo-stack overlay and the save-state gate.
    pub fn availability(&self) -> ActionAvailability {
        let mut avail = actions::resolve(
            &self.selection,
            self.coordinator.recording_active(),
            self.coordinator.script_running(),
        );
        avail.save = self.save_state == SaveState::Dirty;
        avail.undo = self.undo_available;
        avail.redo = self.redo_available;
        avail
    }

    pub fn set_undo_available(&mut self, available: bool) {
        self.undo_available = available;
        self.push_availability();
    }

    pub fn set_redo_available(&mut self, available: bool) {
        self.redo_available = available;
        self.push_availability();
    }

    // ---- Save lifecycle ----

    pub fn is_dirty(&self) -> bool {
        self.save_state != SaveState::Clean
    }

    /// An edit occurred somewhere in the tree or editor pages.
    pub fn mark_dirty(&mut self) {
        self.save_state = SaveState::Dirty;
        self.selection.dirty = true;
        self.push_availability();
    }

    /// User requested a save. The actual persistence happens in the storage
    /// collaborator, which reports back through `on_save_completed`.
    pub fn on_save_requested(&mut self) -> Result<()> {
        if self.save_state != SaveState::Dirty {
            return Err(ConfigError::invalid_operation(
                "save",
                "there are no unsaved changes",
            ));
        }
        self.save_state = SaveState::Saving;
        self.push_availability();
        Ok(())
    }

    pub fn on_save_completed(&mut self, persist_global: bool) {
        debug!(persist_global, "Saving completed");
        if self.save_state != SaveState::Saving {
            warn!("save completion without a save in progress");
        }
        self.save_state = SaveState::Clean;
        self.selection.dirty = false;
        self.undo_available = false;
        self.redo_available = false;
        self.app.config_altered(persist_global);
        self.push_availability();
    }

    // ---- Background tasks ----

    /// Start recording input into the selected script. Requires exactly one
    /// Script selected; the record toggle flips immediately even though
    /// capture begins after `options.delay`.
    pub fn start_record(&mut self, options: RecordOptions) -> Result<()> {
        if self.selection.single_script().is_none() {
            return Err(ConfigError::invalid_operation(
                "record",
                "select exactly one script first",
            ));
        }
        self.coordinator.start_recording(options)?;
        self.view.set_record_active(true);
        self.push_availability();
        Ok(())
    }

    /// Stop recording. Safe to call when no session is active.
    pub fn stop_record(&mut self) {
        self.coordinator.stop_recording();
        self.view.set_record_active(false);
        self.push_availability();
    }

    fn cancel_record(&mut self) {
        if self.coordinator.recording_active() {
            self.stop_record();
        }
    }

    /// Run the selected script on a worker thread. The payload is cloned
    /// NOW: selection changes between this call and the end of the settling
    /// delay do not change which script executes.
    pub fn run_selected_script(&mut self) -> Result<()> {
        let script = self
            .selection
            .single_script()
            .ok_or_else(|| {
                ConfigError::invalid_operation("run script", "select exactly one script first")
            })?
            .clone();

        info!(script = %script.name, "Scheduling script run");
        // Fire-and-forget: the handle is dropped, completion arrives as a
        // TaskEvent. Dropping a ScriptTaskHandle detaches the worker.
        let _handle = self.coordinator.run_script(script)?;
        self.push_availability();
        Ok(())
    }

    /// Drain pending worker notifications. Called from the event loop on
    /// the event thread; returns the number of events handled.
    pub fn process_task_events(&mut self) -> usize {
        let events: Vec<TaskEvent> = self.task_events.try_iter().collect();
        let count = events.len();
        for event in events {
            self.handle_task_event(event);
        }
        count
    }

    fn handle_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::ScriptStarted { name, .. } => {
                self.view.show_status(&format!("Running script '{}'…", name));
                self.push_availability();
            }
            TaskEvent::ScriptCompleted { name, .. } => {
                self.view.show_status(&format!("Script '{}' finished", name));
                self.push_availability();
            }
            TaskEvent::ScriptFailed { name, error, .. } => {
                let err = ConfigError::ScriptExecution {
                    script: name,
                    message: error,
                };
                let message = err.user_message();
                self.last_script_error = Some(message.clone());
                self.view.show_status(&message);
                self.push_availability();
            }
            TaskEvent::RecordingStarted => {
                self.view.set_record_active(true);
            }
            TaskEvent::RecordingStopped => {
                self.view.set_record_active(false);
                self.push_availability();
            }
        }
    }

    /// Show the most recent script failure, if any.
    pub fn on_show_last_error(&self) {
        match &self.last_script_error {
            Some(message) => self.view.show_script_error(message),
            None => self.view.show_status("No script errors recorded"),
        }
    }

    // ---- Close / quit ----

    /// Presentation reports new pane/column geometry whenever the user
    /// resizes; the latest values are what gets persisted on close.
    pub fn set_layout(&mut self, layout: LayoutPrefs) {
        self.layout = layout;
    }

    /// Close the window. Never closes silently while dirty: if the save
    /// prompt is handled the close is aborted and this returns false.
    /// On a real close the two layout preferences are persisted exactly
    /// once and the window is hidden, not destroyed.
    pub fn on_request_close(&mut self) -> bool {
        self.cancel_record();

        if self.is_dirty() && self.app.prompt_to_save() {
            debug!("Close aborted by save prompt");
            return false;
        }

        self.app.persist_layout(&self.layout);
        self.view.set_visible(false);
        info!("Configuration window hidden");
        true
    }

    /// Quit the application. Composes `on_request_close`; shutdown only
    /// proceeds when the close succeeded.
    pub fn quit(&mut self) {
        if self.on_request_close() {
            self.app.shutdown();
        }
    }

    // ---- Monitoring toggle ----

    pub fn toggle_monitoring(&self) {
        self.app.toggle_monitoring();
    }

    /// The global hotkey (or anything else outside this window) flipped the
    /// monitoring service; mirror it onto the checkbox.
    pub fn on_monitoring_state_changed(&self, enabled: bool) {
        self.view.set_monitoring_checked(enabled);
    }

    // ---- Placeholder actions ----

    /// A menu entry with no behavior yet was invoked. Non-fatal by design.
    pub fn unconnected_action(&self, name: &str) {
        warn!(action = name, "Unconnected menu item clicked, nothing happens");
    }

    fn push_availability(&self) -> ActionAvailability {
        let avail = self.availability();
        self.view.set_availability(&avail);
        avail
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
