//! Top-level state machine that sequences detection, pattern runs and stops.
//!
//! ```text
//! Idle -> Detecting -> Ready | Error
//! Ready -> Mining <-> Paused -> Ready | Error
//! any -> Idle (emergency stop)
//! ```
//!
//! A run executes on its own worker thread. Each run carries a generation
//! id; an emergency stop bumps the id so whatever the cancelled worker
//! reports afterwards is ignored and the engine stays Idle.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use anyhow::{bail, Result};
use parking_lot::Mutex;

use crate::config::{MiningConfig, QuickCommand};
use crate::control::RunToken;
use crate::error::{RunError, RunResult};
use crate::input::Actuator;
use crate::logger;
use crate::patterns::{Pattern, PatternContext, PatternOutcome};
use crate::platform::Platform;
use crate::types::{EngineState, WindowId};
use crate::vision::{MaterialDetector, MaterialProfile};

const COUNTDOWN_SECS: u32 = 3;
const FOCUS_SETTLE_MS: u64 = 500;
const QUICK_COMMAND_FOCUS_MS: u64 = 100;

/// Published to every subscriber, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StateChanged(EngineState),
    Log(String),
    Progress(u32),
}

#[derive(Debug)]
struct RunSlot {
    state: EngineState,
    window: Option<WindowId>,
    token: Option<RunToken>,
    /// Generation of the current (or last) run.
    run_id: u64,
    /// Whether the worker for `run_id` has not finished yet.
    worker_active: bool,
}

struct Shared {
    platform: Platform,
    actuator: Arc<Actuator>,
    material: Mutex<MaterialDetector>,
    slot: Mutex<RunSlot>,
    subscribers: Mutex<Vec<mpsc::Sender<EngineEvent>>>,
}

impl Shared {
    fn publish(&self, event: EngineEvent) {
        self.subscribers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn log(&self, msg: &str) {
        logger::info_p("engine", msg);
        self.publish(EngineEvent::Log(msg.to_string()));
    }

    fn set_state_locked(&self, slot: &mut RunSlot, state: EngineState) {
        if slot.state == state {
            return;
        }
        slot.state = state;
        self.publish(EngineEvent::StateChanged(state));
    }

    /// Apply `state` only if run `run_id` is still the current run.
    fn set_run_state(&self, run_id: u64, state: EngineState) -> bool {
        let mut slot = self.slot.lock();
        if slot.run_id != run_id {
            return false;
        }
        self.set_state_locked(&mut slot, state);
        true
    }

    fn is_safe(&self, window: WindowId) -> bool {
        let windows = &self.platform.windows;
        windows.is_window(window) && windows.is_focused(window)
    }
}

pub struct Engine {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(platform: Platform, actuator: Actuator) -> Self {
        Self {
            shared: Arc::new(Shared {
                platform,
                actuator: Arc::new(actuator),
                material: Mutex::new(MaterialDetector::new()),
                slot: Mutex::new(RunSlot {
                    state: EngineState::Idle,
                    window: None,
                    token: None,
                    run_id: 0,
                    worker_active: false,
                }),
                subscribers: Mutex::new(Vec::new()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Engine with a real-time actuator on the platform's input backend.
    pub fn with_platform(platform: Platform) -> Self {
        let actuator = Actuator::new(platform.input.clone());
        Self::new(platform, actuator)
    }

    pub fn subscribe(&self) -> mpsc::Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    pub fn state(&self) -> EngineState {
        self.shared.slot.lock().state
    }

    pub fn window(&self) -> Option<WindowId> {
        self.shared.slot.lock().window
    }

    pub fn window_title(&self) -> Option<String> {
        let window = self.window()?;
        self.shared.platform.windows.title(window)
    }

    pub fn material_profile(&self) -> MaterialProfile {
        self.shared.material.lock().profile()
    }

    pub fn is_calibrated(&self) -> bool {
        self.shared.material.lock().is_calibrated()
    }

    /// Restore a previously learnt material (e.g. from settings).
    pub fn set_material_profile(&self, profile: MaterialProfile) {
        *self.shared.material.lock() = MaterialDetector::with_profile(profile);
    }

    /// Look for the game window. Ignored while a run is active.
    pub fn detect_window(&self) -> bool {
        {
            let mut slot = self.shared.slot.lock();
            if slot.worker_active {
                drop(slot);
                self.shared.log("Cannot search for the window while mining");
                return false;
            }
            self.shared.set_state_locked(&mut slot, EngineState::Detecting);
        }

        let found = self.shared.platform.windows.find_target_window();
        let mut slot = self.shared.slot.lock();
        slot.window = found;
        match found {
            Some(window) => {
                self.shared.set_state_locked(&mut slot, EngineState::Ready);
                drop(slot);
                let title = self.shared.platform.windows.title(window).unwrap_or_default();
                self.shared.log(&format!("Game window found ({})", title));
                true
            }
            None => {
                self.shared.set_state_locked(&mut slot, EngineState::Error);
                drop(slot);
                self.shared.log("Game window not found, start the game and try again");
                false
            }
        }
    }

    fn has_window(&self) -> Option<WindowId> {
        let window = self.window()?;
        self.shared.platform.windows.is_window(window).then_some(window)
    }

    /// Learn the target material from the pixels under the crosshair.
    pub fn calibrate_material(&self) -> bool {
        let Some(window) = self.has_window() else {
            self.shared.log("Find the game window before calibrating");
            return false;
        };
        let Some(frame) = self.shared.platform.frames.capture(window) else {
            self.shared.log("Screen capture failed, is the game in windowed mode?");
            return false;
        };
        let mut material = self.shared.material.lock();
        if !material.calibrate(&frame) {
            drop(material);
            self.shared.log("Could not read the colour, try again");
            return false;
        }
        let r = material.profile().reference;
        drop(material);
        self.shared.log(&format!("Colour learnt: R={} G={} B={}", r.r, r.g, r.b));
        true
    }

    /// Start a run on a worker thread. No-op while a run is active.
    pub fn start_mining(&self, config: MiningConfig) -> Result<()> {
        if self.shared.slot.lock().worker_active {
            self.shared.log("Already mining");
            return Ok(());
        }
        let window = match self.has_window() {
            Some(w) => w,
            None => {
                if !self.detect_window() {
                    bail!("game window not found");
                }
                self.has_window().ok_or_else(|| anyhow::anyhow!("game window vanished"))?
            }
        };

        let config = config.sanitized();
        self.shared.actuator.set_humanize(config.humanize);
        let material = self.shared.material.lock().clone();
        let pattern = Pattern::resolve(config.pattern, self.shared.platform.frames.clone(), window, material);

        let token = RunToken::new();
        let run_id = {
            let mut slot = self.shared.slot.lock();
            if slot.worker_active {
                return Ok(());
            }
            slot.run_id += 1;
            slot.worker_active = true;
            slot.token = Some(token.clone());
            slot.run_id
        };

        self.shared.log(&format!("Mode: {}", config.pattern.name()));
        self.shared.log(&format!("Starting in {} seconds, get in position", COUNTDOWN_SECS));

        // A cut-off worker still owes its final release; it must land before
        // the new run touches input.
        self.join_worker();

        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(format!("mining-{}", run_id))
            .spawn(move || run_worker(shared, run_id, window, token, pattern, config));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let mut slot = self.shared.slot.lock();
                slot.worker_active = false;
                slot.token = None;
                return Err(e.into());
            }
        };

        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Suspend the run at its next boundary.
    pub fn pause(&self) -> bool {
        let mut slot = self.shared.slot.lock();
        if slot.state != EngineState::Mining {
            return false;
        }
        let paused = slot.token.as_ref().map_or(false, |t| t.pause());
        if paused {
            self.shared.set_state_locked(&mut slot, EngineState::Paused);
            drop(slot);
            self.shared.log("Paused");
        }
        paused
    }

    pub fn resume(&self) -> bool {
        let mut slot = self.shared.slot.lock();
        if slot.state != EngineState::Paused {
            return false;
        }
        let resumed = slot.token.as_ref().map_or(false, |t| t.resume());
        if resumed {
            self.shared.set_state_locked(&mut slot, EngineState::Mining);
            drop(slot);
            self.shared.log("Resumed");
        }
        resumed
    }

    /// Cooperative stop; the worker returns the engine to Ready.
    pub fn stop_mining(&self) {
        let token = self.shared.slot.lock().token.clone();
        if let Some(token) = token {
            if !token.is_cancelled() {
                self.shared.log("Stopping...");
                token.cancel();
            }
        }
        self.shared.actuator.release_all_keys();
    }

    /// Cancel, release all input and go to Idle right now, without waiting
    /// for the worker.
    pub fn emergency_stop(&self) {
        {
            let mut slot = self.shared.slot.lock();
            if let Some(token) = slot.token.take() {
                token.cancel();
            }
            slot.run_id += 1;
            slot.worker_active = false;
            self.shared.set_state_locked(&mut slot, EngineState::Idle);
        }
        self.shared.actuator.release_all_keys();
        logger::warn_p("engine", "emergency stop");
        self.shared.log("EMERGENCY STOP! Everything released");
    }

    /// Start when Ready, Idle or Error; stop when Mining or Paused.
    pub fn toggle_mining(&self, config: MiningConfig) -> Result<()> {
        match self.state() {
            EngineState::Mining | EngineState::Paused => {
                self.stop_mining();
                Ok(())
            }
            EngineState::Ready | EngineState::Idle | EngineState::Error => self.start_mining(config),
            EngineState::Detecting => Ok(()),
        }
    }

    /// Type a chat command into the game. Refused while a run is active.
    pub fn send_quick_command(&self, command: &QuickCommand) -> Result<()> {
        if self.shared.slot.lock().worker_active {
            bail!("quick commands are disabled while mining");
        }
        let Some(window) = self.has_window() else {
            bail!("game window not detected");
        };
        if !self.shared.platform.windows.bring_to_front(window) {
            bail!("could not focus the game window");
        }
        let token = RunToken::new();
        let actuator = &self.shared.actuator;
        let typed = actuator
            .delay(&token, QUICK_COMMAND_FOCUS_MS)
            .and_then(|_| actuator.type_chat_command_fast(&token, &command.command, command.speed));
        actuator.release_all_keys();
        typed?;
        self.shared.log(&format!("Quick command sent: {}", command.command));
        Ok(())
    }

    /// Block until the current worker (if any) has exited.
    pub fn join_worker(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(token) = self.shared.slot.lock().token.take() {
            token.cancel();
        }
        self.join_worker();
        self.shared.actuator.release_all_keys();
    }
}

fn run_worker(
    shared: Arc<Shared>,
    run_id: u64,
    window: WindowId,
    token: RunToken,
    pattern: Pattern,
    config: MiningConfig,
) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        execute(&shared, run_id, window, &token, &pattern, &config)
    }))
    .unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "worker panicked".to_string());
        Err(RunError::Fault(anyhow::anyhow!(msg)))
    });

    let current = shared.slot.lock().run_id == run_id;
    let next = match &result {
        Ok(outcome) => {
            if current {
                report_outcome(&shared, *outcome);
            }
            EngineState::Ready
        }
        Err(RunError::Cancelled) => {
            if current {
                shared.log("Mining stopped");
            }
            EngineState::Ready
        }
        Err(RunError::Fault(e)) => {
            logger::error_p("engine", &format!("run {} failed: {:#}", run_id, e));
            if current {
                shared.log(&format!("Problem: {}", e));
            }
            EngineState::Error
        }
    };

    shared.actuator.release_all_keys();
    let mut slot = shared.slot.lock();
    if slot.run_id == run_id {
        slot.worker_active = false;
        slot.token = None;
        shared.set_state_locked(&mut slot, next);
    }
}

fn execute(
    shared: &Shared,
    run_id: u64,
    window: WindowId,
    token: &RunToken,
    pattern: &Pattern,
    config: &MiningConfig,
) -> RunResult<PatternOutcome> {
    for n in (1..=COUNTDOWN_SECS).rev() {
        shared.log(&format!("{}...", n));
        shared.actuator.delay(token, 1000)?;
    }

    shared.log("Switching to the game window");
    shared.platform.windows.bring_to_front(window);
    shared.actuator.delay(token, FOCUS_SETTLE_MS)?;
    token.checkpoint()?;

    if !shared.set_run_state(run_id, EngineState::Mining) {
        return Err(RunError::Cancelled);
    }
    shared.log("Go! Hands off the keyboard and mouse");

    let log = |msg: &str| shared.log(msg);
    let progress = |n: u32| shared.publish(EngineEvent::Progress(n));
    let is_safe = || shared.is_safe(window);
    let ctx = PatternContext {
        input: &shared.actuator,
        config,
        token,
        log: &log,
        progress: &progress,
        is_safe: &is_safe,
    };
    pattern.run(&ctx)
}

fn report_outcome(shared: &Shared, outcome: PatternOutcome) {
    match outcome {
        PatternOutcome::Completed { blocks } => {
            shared.log(&format!("Finished, {} blocks mined", blocks))
        }
        PatternOutcome::SafetyAbort { blocks } => {
            shared.log(&format!("Stopped for safety after {} blocks", blocks))
        }
        PatternOutcome::ToolLost { blocks } => {
            shared.log(&format!("Tool lost after {} blocks", blocks))
        }
        PatternOutcome::PlayerDetected { blocks } => {
            logger::warn_p("engine", "player detected, disconnected");
            shared.log(&format!("Disconnected after {} blocks", blocks))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::PatternKind;
    use crate::sleep::FixedJitter;
    use crate::platform::{FrameSource, Key, MouseButton};
    use crate::testing::{Action, FixedWindow, RecordingInput, ScriptedFrames};
    use crate::types::Rgb;
    use crate::vision::Frame;

    struct PanickingFrames;

    impl FrameSource for PanickingFrames {
        fn capture(&self, _window: WindowId) -> Option<Frame> {
            panic!("capture exploded");
        }
    }

    fn engine_with(window: Arc<FixedWindow>) -> (Arc<RecordingInput>, Engine) {
        let input = Arc::new(RecordingInput::new());
        let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, Rgb::new(200, 10, 90))));
        let platform = Platform::new(input.clone(), frames, window);
        let actuator = Actuator::new(input.clone())
            .with_time_scale(0.0)
            .with_jitter(Box::new(FixedJitter(0)));
        (input, Engine::new(platform, actuator))
    }

    fn states(rx: &mpsc::Receiver<EngineEvent>) -> Vec<EngineState> {
        rx.try_iter()
            .filter_map(|e| match e {
                EngineEvent::StateChanged(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_detect_success_and_failure() {
        let (_, engine) = engine_with(Arc::new(FixedWindow::new(7)));
        let rx = engine.subscribe();
        assert!(engine.detect_window());
        assert_eq!(states(&rx), vec![EngineState::Detecting, EngineState::Ready]);

        let (_, engine) = engine_with(Arc::new(FixedWindow::absent()));
        let rx = engine.subscribe();
        assert!(!engine.detect_window());
        assert_eq!(states(&rx), vec![EngineState::Detecting, EngineState::Error]);
    }

    #[test]
    fn test_start_without_window_fails_into_error() {
        let (_, engine) = engine_with(Arc::new(FixedWindow::absent()));
        assert!(engine.start_mining(MiningConfig::default()).is_err());
        assert_eq!(engine.state(), EngineState::Error);
    }

    #[test]
    fn test_full_run_returns_to_ready() {
        let (input, engine) = engine_with(Arc::new(FixedWindow::new(7)));
        let rx = engine.subscribe();
        let config = MiningConfig { block_count: 2, ..MiningConfig::default() };
        engine.start_mining(config).unwrap();
        engine.join_worker();

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(input.mine_count(), 2);
        assert!(input.held_keys().is_empty());
        let events: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(events.contains(&EngineEvent::Progress(2)));
        let seen: Vec<EngineState> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::StateChanged(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            seen,
            vec![EngineState::Detecting, EngineState::Ready, EngineState::Mining, EngineState::Ready]
        );
    }

    #[test]
    fn test_calibrate_uses_owned_detector() {
        let (_, engine) = engine_with(Arc::new(FixedWindow::new(7)));
        assert!(!engine.calibrate_material());
        engine.detect_window();
        assert!(engine.calibrate_material());
        assert!(engine.is_calibrated());
        assert_eq!(engine.material_profile().reference, Rgb::new(200, 10, 90));
    }

    #[test]
    fn test_emergency_stop_goes_idle_immediately() {
        let window = Arc::new(FixedWindow::new(7));
        let input = Arc::new(RecordingInput::new());
        let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, Rgb::BLACK)));
        let platform = Platform::new(input.clone(), frames, window);
        // Real-time waits so the run is still in its countdown.
        let engine = Engine::new(platform, Actuator::new(input.clone()));
        engine.start_mining(MiningConfig::default()).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        engine.emergency_stop();
        assert_eq!(engine.state(), EngineState::Idle);
        engine.join_worker();
        // The cut-off worker must not move the state back to Ready.
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(input.held_keys().is_empty());
        assert_eq!(input.mine_count(), 0);
    }

    #[test]
    fn test_quick_command_refused_while_mining() {
        let window = Arc::new(FixedWindow::new(7));
        let input = Arc::new(RecordingInput::new());
        let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, Rgb::BLACK)));
        let platform = Platform::new(input.clone(), frames, window);
        let engine = Engine::new(platform, Actuator::new(input.clone()));
        engine.start_mining(MiningConfig { pattern: PatternKind::AutoClick, ..MiningConfig::default() }).unwrap();
        assert!(engine.send_quick_command(&QuickCommand::default()).is_err());
        engine.emergency_stop();
        engine.join_worker();
    }

    #[test]
    fn test_quick_command_types_text() {
        let (input, engine) = engine_with(Arc::new(FixedWindow::new(7)));
        engine.detect_window();
        engine.send_quick_command(&QuickCommand::default()).unwrap();
        assert_eq!(input.typed_text(), "/feed");
    }

    #[test]
    fn test_worker_panic_ends_in_error() {
        let input = Arc::new(RecordingInput::new());
        let platform = Platform::new(input.clone(), Arc::new(PanickingFrames), Arc::new(FixedWindow::new(7)));
        let actuator = Actuator::new(input.clone())
            .with_time_scale(0.0)
            .with_jitter(Box::new(FixedJitter(0)));
        let engine = Engine::new(platform, actuator);
        let rx = engine.subscribe();

        let config = MiningConfig { pattern: PatternKind::SmartMining, ..MiningConfig::default() };
        engine.start_mining(config).unwrap();
        engine.join_worker();

        assert_eq!(engine.state(), EngineState::Error);
        assert!(input.held_keys().is_empty());
        assert!(input.held_buttons().is_empty());
        let events: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Log(m) if m.contains("capture exploded"))));
        assert_eq!(events.last(), Some(&EngineEvent::StateChanged(EngineState::Error)));

        // An errored engine can start again.
        assert!(engine.toggle_mining(MiningConfig { block_count: 1, ..MiningConfig::default() }).is_ok());
        engine.join_worker();
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[test]
    fn test_focus_lost_mid_run_stops_for_safety() {
        let window = Arc::new(FixedWindow::new(7));
        let input = Arc::new(RecordingInput::new());
        let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, Rgb::BLACK)));
        let platform = Platform::new(input.clone(), frames, window.clone());
        let actuator = Actuator::new(input.clone())
            .with_time_scale(0.01)
            .with_jitter(Box::new(FixedJitter(0)));
        let engine = Engine::new(platform, actuator);
        let rx = engine.subscribe();

        engine.start_mining(MiningConfig { block_count: 10_000, ..MiningConfig::default() }).unwrap();
        let mining = rx
            .iter()
            .any(|e| e == EngineEvent::StateChanged(EngineState::Mining));
        assert!(mining);
        window.set_focused(false);
        engine.join_worker();

        assert_eq!(engine.state(), EngineState::Ready);
        assert!(input.mine_count() < 10_000);
        assert!(input.held_buttons().is_empty());
        let logs: Vec<String> = rx
            .try_iter()
            .filter_map(|e| match e {
                EngineEvent::Log(m) => Some(m),
                _ => None,
            })
            .collect();
        assert!(logs.iter().any(|m| m.contains("no longer focused")));
        assert!(logs.iter().any(|m| m.starts_with("Stopped for safety after")));
    }

    #[test]
    fn test_vanished_window_blocks_calibration() {
        let window = Arc::new(FixedWindow::new(7));
        let (_, engine) = engine_with(window.clone());
        engine.detect_window();
        window.set_present(false);
        assert!(!engine.calibrate_material());
        assert!(!engine.is_calibrated());
    }

    #[test]
    fn test_restart_after_emergency_stop_reaps_old_worker_first() {
        let window = Arc::new(FixedWindow::new(7));
        let input = Arc::new(RecordingInput::new());
        let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, Rgb::BLACK)));
        let platform = Platform::new(input.clone(), frames, window);
        let actuator = Actuator::new(input.clone())
            .with_time_scale(0.01)
            .with_jitter(Box::new(FixedJitter(0)));
        let engine = Engine::new(platform, actuator);

        engine.start_mining(MiningConfig::default()).unwrap();
        engine.emergency_stop();
        engine.start_mining(MiningConfig { block_count: 2, ..MiningConfig::default() }).unwrap();

        // emergency stop + the cut-off worker's own release, nothing else yet
        let released = input.actions().iter().filter(|a| **a == Action::KeyUp(Key::W)).count();
        assert_eq!(released, 2);

        engine.join_worker();
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(input.mine_count(), 2);
        let actions = input.actions();
        let first_press = actions.iter().position(|a| *a == Action::Mouse(MouseButton::Left, true)).unwrap();
        let early_releases = actions[..first_press].iter().filter(|a| **a == Action::KeyUp(Key::W)).count();
        assert_eq!(early_releases, 2);
    }
}
