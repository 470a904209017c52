//! Background task coordination - script execution and input recording
//!
//! The window runs at most two background operations: one script execution
//! and one input-recording session. Both are started from the event thread
//! and must never block it. Workers report lifecycle transitions as
//! `TaskEvent`s over a channel; they never mutate controller or presentation
//! state directly, so "script finished" can never race a selection change.
//!
//! Overlap is rejected here, not just by button disablement in the UI: a
//! second `run_script` while one is in flight fails with
//! `ScriptAlreadyRunning`, and `start_recording` fails while a script runs.
//!
//! Known limitation: a script execution, once started, cannot be cancelled.
//! The returned `ScriptTaskHandle` exposes status and a join point so a
//! future cancellation token has somewhere to live, but stopping a runaway
//! script currently means waiting it out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, Result, ResultExt};
use crate::items::Script;

/// Fixed pause before a script is handed to the interpreter, so UI state
/// (e.g. a just-closed menu popup) settles before synthetic input goes out.
/// Deliberate, not incidental. Tests shrink it via `with_settle_delay`.
pub const SCRIPT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// What the recorder should capture, and how long to wait before capturing.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordOptions {
    pub record_keyboard: bool,
    pub record_mouse: bool,
    /// Grace period before capture begins, applied by the recorder itself.
    pub delay: Duration,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            record_keyboard: true,
            record_mouse: false,
            delay: Duration::ZERO,
        }
    }
}

/// Exists only while a recording session is active.
#[derive(Clone, Debug)]
struct RecordingState {
    options: RecordOptions,
}

/// The excluded script interpreter, behind a seam. Implementations run on a
/// worker thread; errors are reported, never panicked across the boundary.
pub trait ScriptRunner: Send + Sync {
    fn execute(&self, script: &Script) -> anyhow::Result<()>;
}

/// The excluded input recorder. `arm` must not block: the recorder applies
/// `options.delay` itself before capture begins.
pub trait InputRecorder: Send + Sync {
    fn arm(&self, options: &RecordOptions) -> anyhow::Result<()>;
    fn stop(&self);
}

/// Lifecycle of one script run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptRunStatus {
    Pending,
    Running,
    Completed,
    Failed(String),
}

impl ScriptRunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Handle to an in-flight script run. Not cancellable (see module docs);
/// it exposes status for the controller and a join point for tests.
pub struct ScriptTaskHandle {
    script_id: u64,
    script_name: String,
    status: Arc<Mutex<ScriptRunStatus>>,
    join: Option<JoinHandle<()>>,
}

impl ScriptTaskHandle {
    pub fn script_id(&self) -> u64 {
        self.script_id
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn status(&self) -> ScriptRunStatus {
        self.status.lock().clone()
    }

    /// Block until the worker finishes. Event-thread code should prefer the
    /// completion `TaskEvent` instead.
    pub fn join(mut self) -> ScriptRunStatus {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
        self.status.lock().clone()
    }
}

/// Notifications posted by workers, drained by the controller on the event
/// thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskEvent {
    ScriptStarted { id: u64, name: String },
    ScriptCompleted { id: u64, name: String },
    ScriptFailed { id: u64, name: String, error: String },
    RecordingStarted,
    RecordingStopped,
}

/// Clears the running flag when the worker exits, including on unwind.
struct RunningFlagGuard(Arc<AtomicBool>);

impl Drop for RunningFlagGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct BackgroundTaskCoordinator {
    runner: Arc<dyn ScriptRunner>,
    recorder: Arc<dyn InputRecorder>,
    events: Sender<TaskEvent>,
    script_running: Arc<AtomicBool>,
    recording: Mutex<Option<RecordingState>>,
    settle_delay: Duration,
}

impl BackgroundTaskCoordinator {
    /// Build a coordinator and the event channel the controller drains.
    pub fn new(
        runner: Arc<dyn ScriptRunner>,
        recorder: Arc<dyn InputRecorder>,
    ) -> (Self, Receiver<TaskEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                runner,
                recorder,
                events: tx,
                script_running: Arc::new(AtomicBool::new(false)),
                recording: Mutex::new(None),
                settle_delay: SCRIPT_SETTLE_DELAY,
            },
            rx,
        )
    }

    /// Override the settling delay. Tests pass `Duration::ZERO`.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub(crate) fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    pub fn script_running(&self) -> bool {
        self.script_running.load(Ordering::SeqCst)
    }

    pub fn recording_active(&self) -> bool {
        self.recording.lock().is_some()
    }

    /// Start an input-recording session. The presentation toggle flips
    /// immediately (optimistic) even though capture begins after
    /// `options.delay`.
    pub fn start_recording(&self, options: RecordOptions) -> Result<()> {
        if self.script_running() {
            return Err(ConfigError::RecordingUnavailable(
                "a script is currently running".into(),
            ));
        }

        let mut recording = self.recording.lock();
        if recording.is_some() {
            return Err(ConfigError::RecordingUnavailable(
                "a recording session is already active".into(),
            ));
        }

        self.recorder
            .arm(&options)
            .map_err(ConfigError::RecorderArm)?;

        info!(
            record_keyboard = options.record_keyboard,
            record_mouse = options.record_mouse,
            delay_ms = options.delay.as_millis() as u64,
            "Recording armed"
        );
        *recording = Some(RecordingState { options });
        self.notify(TaskEvent::RecordingStarted);
        Ok(())
    }

    /// Stop recording. Idempotent: a no-op when no session is active.
    pub fn stop_recording(&self) {
        let mut recording = self.recording.lock();
        match recording.take() {
            Some(state) => {
                self.recorder.stop();
                info!(
                    record_keyboard = state.options.record_keyboard,
                    record_mouse = state.options.record_mouse,
                    "Recording stopped"
                );
                self.notify(TaskEvent::RecordingStopped);
            }
            None => debug!("stop_recording with no active session, ignoring"),
        }
    }

    /// Execute `script` on a worker thread. The payload is taken by value:
    /// whatever was selected at schedule time is what runs, and the item
    /// tree is free to mutate afterwards. The caller returns immediately.
    pub fn run_script(&self, script: Script) -> Result<ScriptTaskHandle> {
        // Hard-enforced, not just button disablement in the UI.
        if self
            .script_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(script = %script.name, "Rejected overlapping script run");
            return Err(ConfigError::ScriptAlreadyRunning);
        }

        let status = Arc::new(Mutex::new(ScriptRunStatus::Pending));
        let script_id = script.id;
        let script_name = script.name.clone();

        let runner = Arc::clone(&self.runner);
        let events = self.events.clone();
        let worker_status = Arc::clone(&status);
        let flag_guard = RunningFlagGuard(Arc::clone(&self.script_running));
        let settle_delay = self.settle_delay;

        let join = thread::spawn(move || {
            let _flag_guard = flag_guard;

            *worker_status.lock() = ScriptRunStatus::Running;
            events
                .send(TaskEvent::ScriptStarted {
                    id: script.id,
                    name: script.name.clone(),
                })
                .warn_on_err();

            // Let UI state (a just-closed popup, focus changes) settle
            // before the interpreter starts emitting synthetic input.
            thread::sleep(settle_delay);

            let outcome = catch_unwind(AssertUnwindSafe(|| runner.execute(&script)));
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => Err(anyhow::anyhow!(
                    "script runner panicked: {}",
                    panic_message(&panic)
                )),
            };

            match result {
                Ok(()) => {
                    info!(script = %script.name, "Script completed");
                    *worker_status.lock() = ScriptRunStatus::Completed;
                    events
                        .send(TaskEvent::ScriptCompleted {
                            id: script.id,
                            name: script.name.clone(),
                        })
                        .warn_on_err();
                }
                Err(e) => {
                    let detail = format!("{:#}", e);
                    error!(script = %script.name, error = %detail, "Script failed");
                    *worker_status.lock() = ScriptRunStatus::Failed(detail.clone());
                    events
                        .send(TaskEvent::ScriptFailed {
                            id: script.id,
                            name: script.name.clone(),
                            error: detail,
                        })
                        .warn_on_err();
                }
            }
        });

        Ok(ScriptTaskHandle {
            script_id,
            script_name,
            status,
            join: Some(join),
        })
    }

    fn notify(&self, event: TaskEvent) {
        // The receiver only drops when the window is being torn down.
        if self.events.send(event).is_err() {
            debug!("Task event dropped, controller channel closed");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
