use super::*;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

/// Runner that records what it executed and can be told to block or fail.
struct FakeRunner {
    executed: Mutex<Vec<String>>,
    fail_with: Option<String>,
    /// When set, execute() blocks until a value arrives.
    release: Mutex<Option<Receiver<()>>>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail_with: None,
            release: Mutex::new(None),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    fn blocking() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let runner = Self {
            release: Mutex::new(Some(rx)),
            ..Self::new()
        };
        (runner, tx)
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

impl ScriptRunner for FakeRunner {
    fn execute(&self, script: &Script) -> anyhow::Result<()> {
        self.executed.lock().push(script.name.clone());
        if let Some(rx) = self.release.lock().as_ref() {
            let _ = rx.recv_timeout(Duration::from_secs(5));
        }
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!("{}", message.clone())),
            None => Ok(()),
        }
    }
}

/// Recorder that counts arm/stop calls.
#[derive(Default)]
struct FakeRecorder {
    armed: Mutex<Vec<RecordOptions>>,
    stop_count: Mutex<usize>,
}

impl InputRecorder for FakeRecorder {
    fn arm(&self, options: &RecordOptions) -> anyhow::Result<()> {
        self.armed.lock().push(options.clone());
        Ok(())
    }

    fn stop(&self) {
        *self.stop_count.lock() += 1;
    }
}

fn script(id: u64, name: &str) -> Script {
    Script {
        id,
        name: name.to_string(),
        body: format!("// body of {name}"),
    }
}

fn coordinator_with(
    runner: FakeRunner,
) -> (BackgroundTaskCoordinator, Receiver<TaskEvent>, Arc<FakeRunner>) {
    let runner = Arc::new(runner);
    let (coordinator, events) = BackgroundTaskCoordinator::new(
        Arc::clone(&runner) as Arc<dyn ScriptRunner>,
        Arc::new(FakeRecorder::default()),
    );
    (
        coordinator.with_settle_delay(Duration::ZERO),
        events,
        runner,
    )
}

fn recv(events: &Receiver<TaskEvent>) -> TaskEvent {
    events
        .recv_timeout(Duration::from_secs(5))
        .expect("expected a task event")
}

#[test]
fn test_run_script_executes_and_reports_completion() {
    let (coordinator, events, runner) = coordinator_with(FakeRunner::new());

    let handle = coordinator.run_script(script(1, "greet")).unwrap();
    assert_eq!(
        recv(&events),
        TaskEvent::ScriptStarted {
            id: 1,
            name: "greet".into()
        }
    );
    assert_eq!(
        recv(&events),
        TaskEvent::ScriptCompleted {
            id: 1,
            name: "greet".into()
        }
    );
    assert_eq!(handle.join(), ScriptRunStatus::Completed);
    assert_eq!(runner.executed(), vec!["greet".to_string()]);
    assert!(!coordinator.script_running());
}

#[test]
fn test_run_script_returns_before_execution_finishes() {
    let (runner, release) = FakeRunner::blocking();
    let (coordinator, events, _runner) = coordinator_with(runner);

    let handle = coordinator.run_script(script(1, "slow")).unwrap();
    // The caller got its handle back while the worker is still blocked.
    assert_eq!(recv(&events), TaskEvent::ScriptStarted { id: 1, name: "slow".into() });
    assert!(coordinator.script_running());
    assert!(!handle.status().is_terminal());

    release.send(()).unwrap();
    assert_eq!(handle.join(), ScriptRunStatus::Completed);
}

#[test]
fn test_overlapping_run_is_rejected() {
    let (runner, release) = FakeRunner::blocking();
    let (coordinator, events, runner) = coordinator_with(runner);

    let handle = coordinator.run_script(script(1, "first")).unwrap();
    let _ = recv(&events); // ScriptStarted

    let second = coordinator.run_script(script(2, "second"));
    assert!(matches!(second, Err(ConfigError::ScriptAlreadyRunning)));

    release.send(()).unwrap();
    handle.join();

    // Only the first script ever reached the runner.
    assert_eq!(runner.executed(), vec!["first".to_string()]);

    // The slot frees up once the worker exits.
    let handle = coordinator.run_script(script(3, "third")).unwrap();
    handle.join();
}

#[test]
fn test_failed_script_surfaces_error_detail() {
    let (coordinator, events, _runner) =
        coordinator_with(FakeRunner::failing("interpreter exited with code 1"));

    let handle = coordinator.run_script(script(4, "broken")).unwrap();
    let _ = recv(&events); // ScriptStarted
    match recv(&events) {
        TaskEvent::ScriptFailed { id, name, error } => {
            assert_eq!(id, 4);
            assert_eq!(name, "broken");
            assert!(error.contains("interpreter exited with code 1"));
        }
        other => panic!("expected ScriptFailed, got {:?}", other),
    }
    assert!(matches!(handle.join(), ScriptRunStatus::Failed(_)));
    assert!(!coordinator.script_running());
}

#[test]
fn test_panicking_runner_is_contained() {
    struct PanickingRunner;
    impl ScriptRunner for PanickingRunner {
        fn execute(&self, _script: &Script) -> anyhow::Result<()> {
            panic!("interpreter blew up");
        }
    }

    let (coordinator, events) = BackgroundTaskCoordinator::new(
        Arc::new(PanickingRunner),
        Arc::new(FakeRecorder::default()),
    );
    let coordinator = coordinator.with_settle_delay(Duration::ZERO);

    let handle = coordinator.run_script(script(5, "kaboom")).unwrap();
    let _ = recv(&events); // ScriptStarted
    match recv(&events) {
        TaskEvent::ScriptFailed { error, .. } => {
            assert!(error.contains("interpreter blew up"));
        }
        other => panic!("expected ScriptFailed, got {:?}", other),
    }
    // The running flag is released even after a panic.
    assert!(matches!(handle.join(), ScriptRunStatus::Failed(_)));
    assert!(!coordinator.script_running());
}

#[test]
fn test_payload_is_captured_at_schedule_time() {
    let (coordinator, events, runner) = coordinator_with(FakeRunner::new());

    let mut selected = script(1, "original");
    let handle = coordinator.run_script(selected.clone()).unwrap();

    // "Selection changes" after scheduling: the caller's copy mutating has
    // no effect on what the worker executes.
    selected.name = "replaced".to_string();
    selected.body = "// different".to_string();

    handle.join();
    let _ = recv(&events);
    let _ = recv(&events);
    assert_eq!(runner.executed(), vec!["original".to_string()]);
}

#[test]
fn test_worker_survives_dropped_event_channel() {
    let (coordinator, events, runner) = coordinator_with(FakeRunner::new());

    // Window teardown can drop the receiver while a run is in flight; the
    // worker logs the lost notifications and still finishes cleanly.
    drop(events);
    let handle = coordinator.run_script(script(9, "orphan")).unwrap();
    assert_eq!(handle.join(), ScriptRunStatus::Completed);
    assert_eq!(runner.executed(), vec!["orphan".to_string()]);
    assert!(!coordinator.script_running());
}

#[test]
fn test_start_recording_arms_recorder_and_notifies() {
    let recorder = Arc::new(FakeRecorder::default());
    let (coordinator, events) = BackgroundTaskCoordinator::new(
        Arc::new(FakeRunner::new()),
        Arc::clone(&recorder) as Arc<dyn InputRecorder>,
    );

    let options = RecordOptions {
        record_keyboard: true,
        record_mouse: true,
        delay: Duration::from_secs(3),
    };
    coordinator.start_recording(options.clone()).unwrap();

    assert!(coordinator.recording_active());
    assert_eq!(recv(&events), TaskEvent::RecordingStarted);
    assert_eq!(recorder.armed.lock().as_slice(), &[options]);
}

#[test]
fn test_second_recording_start_is_rejected() {
    let (coordinator, _events) = BackgroundTaskCoordinator::new(
        Arc::new(FakeRunner::new()),
        Arc::new(FakeRecorder::default()),
    );

    coordinator.start_recording(RecordOptions::default()).unwrap();
    let second = coordinator.start_recording(RecordOptions::default());
    assert!(matches!(second, Err(ConfigError::RecordingUnavailable(_))));
}

#[test]
fn test_recording_rejected_while_script_runs() {
    let (runner, release) = FakeRunner::blocking();
    let (coordinator, events, _runner) = coordinator_with(runner);

    let handle = coordinator.run_script(script(1, "busy")).unwrap();
    let _ = recv(&events);

    let result = coordinator.start_recording(RecordOptions::default());
    assert!(matches!(result, Err(ConfigError::RecordingUnavailable(_))));

    release.send(()).unwrap();
    handle.join();
}

#[test]
fn test_stop_recording_is_idempotent() {
    let recorder = Arc::new(FakeRecorder::default());
    let (coordinator, events) = BackgroundTaskCoordinator::new(
        Arc::new(FakeRunner::new()),
        Arc::clone(&recorder) as Arc<dyn InputRecorder>,
    );

    coordinator.start_recording(RecordOptions::default()).unwrap();
    coordinator.stop_recording();
    assert!(!coordinator.recording_active());

    // Second stop is a no-op: no extra recorder.stop(), no extra event.
    coordinator.stop_recording();
    assert!(!coordinator.recording_active());
    assert_eq!(*recorder.stop_count.lock(), 1);

    assert_eq!(recv(&events), TaskEvent::RecordingStarted);
    assert_eq!(recv(&events), TaskEvent::RecordingStopped);
    assert_eq!(
        events.recv_timeout(Duration::from_millis(50)),
        Err(RecvTimeoutError::Timeout)
    );
}

#[test]
fn test_stop_recording_without_session_is_safe() {
    let (coordinator, events) = BackgroundTaskCoordinator::new(
        Arc::new(FakeRunner::new()),
        Arc::new(FakeRecorder::default()),
    );
    coordinator.stop_recording();
    coordinator.stop_recording();
    assert!(!coordinator.recording_active());
    assert_eq!(
        events.recv_timeout(Duration::from_millis(50)),
        Err(RecvTimeoutError::Timeout)
    );
}
