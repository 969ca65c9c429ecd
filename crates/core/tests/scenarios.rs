//! End-to-end pattern runs against recording fakes with instant waits.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use automine_core::config::{Area, Cuboid, MiningConfig};
use automine_core::input::Actuator;
use automine_core::patterns::{Pattern, PatternContext, PatternOutcome, SmartMining};
use automine_core::platform::{Key, MouseButton, Platform};
use automine_core::sleep::FixedJitter;
use automine_core::testing::{Action, FixedWindow, RecordingInput, ScriptedFrames};
use automine_core::types::Rgb;
use automine_core::vision::{Frame, MaterialDetector};
use automine_core::{Engine, EngineEvent, EngineState, RunResult, RunToken};

const STONE: Rgb = Rgb::new(120, 120, 120);

struct Run {
    input: Arc<RecordingInput>,
    logs: Vec<String>,
    progress: Vec<u32>,
    result: RunResult<PatternOutcome>,
}

fn instant_actuator(input: Arc<RecordingInput>) -> Actuator {
    Actuator::new(input).with_time_scale(0.0).with_jitter(Box::new(FixedJitter(0)))
}

fn run_pattern(pattern: Pattern, config: MiningConfig, token: RunToken) -> Run {
    let input = Arc::new(RecordingInput::new());
    let actuator = instant_actuator(input.clone());
    let logs = Mutex::new(Vec::new());
    let progress = Mutex::new(Vec::new());
    let log = |m: &str| logs.lock().push(m.to_string());
    let report = |n: u32| progress.lock().push(n);
    let safe = || true;
    let ctx = PatternContext {
        input: &actuator,
        config: &config,
        token: &token,
        log: &log,
        progress: &report,
        is_safe: &safe,
    };
    let result = pattern.run(&ctx);
    Run { input, logs: logs.into_inner(), progress: progress.into_inner(), result }
}

#[test]
fn test_auto_click_three_blocks() {
    let config = MiningConfig { block_count: 3, ..MiningConfig::default() };
    let run = run_pattern(Pattern::AutoClick, config, RunToken::new());

    assert_eq!(run.result.unwrap(), PatternOutcome::Completed { blocks: 3 });
    assert_eq!(run.input.mine_count(), 3);
    assert_eq!(run.progress, vec![1, 2, 3]);
    assert!(run.logs.last().unwrap().contains('3'));
}

#[test]
fn test_wall_breaker_serpentine_order() {
    let config = MiningConfig { wall: Area { width: 2, height: 2 }, ..MiningConfig::default() };
    let run = run_pattern(Pattern::WallBreaker, config, RunToken::new());
    assert_eq!(run.result.unwrap(), PatternOutcome::Completed { blocks: 4 });

    // Reconstruct the aim position at each mine from the pointer moves.
    let mut aim = (0, 0);
    let mut mined_at = Vec::new();
    for action in run.input.actions() {
        match action {
            Action::Move(dx, dy) => aim = (aim.0 + dx, aim.1 + dy),
            Action::Mouse(MouseButton::Left, true) => mined_at.push(aim),
            _ => {}
        }
    }
    // (col, row) in pixels: row0col0, row0col1, row1col1, row1col0
    assert_eq!(mined_at, vec![(0, 0), (80, 0), (80, 80), (0, 80)]);
}

#[test]
fn test_smart_mining_gives_up_after_five_empty_scans() {
    let frames = Arc::new(ScriptedFrames::constant(Frame::solid(320, 240, STONE)));
    let pattern = Pattern::SmartMining(SmartMining::new(frames.clone(), 1, MaterialDetector::new()));
    let run = run_pattern(pattern, MiningConfig::default(), RunToken::new());

    assert_eq!(run.result.unwrap(), PatternOutcome::Completed { blocks: 0 });
    assert_eq!(frames.captures(), 5);
    assert_eq!(run.input.mine_count(), 0);
}

#[test]
fn test_column_single_position() {
    let config = MiningConfig {
        column: Cuboid { width: 1, length: 1, depth: 3 },
        ..MiningConfig::default()
    };
    let run = run_pattern(Pattern::ColumnMining, config, RunToken::new());

    assert_eq!(run.result.unwrap(), PatternOutcome::Completed { blocks: 3 });
    assert_eq!(run.input.mine_count(), 3);
    let typed = run.input.typed_text();
    assert_eq!(typed, "/home mine");
    assert!(!typed.contains("/sethome"));
    // no movement at all: mined at the home position
    let moved = run
        .input
        .actions()
        .iter()
        .any(|a| matches!(a, Action::KeyDown(Key::S | Key::A | Key::D)));
    assert!(!moved);
}

#[test]
fn test_cancel_while_paused_terminates_as_cancellation() {
    let token = RunToken::new();
    token.pause();
    let worker = {
        let token = token.clone();
        thread::spawn(move || {
            let config = MiningConfig { block_count: 100, ..MiningConfig::default() };
            run_pattern(Pattern::AutoClick, config, token)
        })
    };

    // Paused far longer than any wait inside the pattern.
    thread::sleep(Duration::from_millis(300));
    assert!(!worker.is_finished());

    token.cancel();
    let run = worker.join().unwrap();
    assert!(run.result.unwrap_err().is_cancelled());
    assert_eq!(run.input.mine_count(), 0);
}

#[test]
fn test_release_all_keys_twice() {
    let input = Arc::new(RecordingInput::new());
    let actuator = instant_actuator(input.clone());
    for _ in 0..2 {
        actuator.release_all_keys();
        assert!(input.held_keys().is_empty());
        assert!(input.held_buttons().is_empty());
    }
}

#[test]
fn test_engine_pause_resume_stop() {
    let input = Arc::new(RecordingInput::new());
    let frames = Arc::new(ScriptedFrames::constant(Frame::solid(64, 64, STONE)));
    let window = Arc::new(FixedWindow::new(42));
    let platform = Platform::new(input.clone(), frames, window);
    // Short real waits so the run is still going while we poke it.
    let actuator = Actuator::new(input.clone()).with_time_scale(0.01).with_jitter(Box::new(FixedJitter(0)));
    let engine = Engine::new(platform, actuator);
    let events = engine.subscribe();

    let config = MiningConfig { block_count: 10_000, ..MiningConfig::default() };
    engine.start_mining(config).unwrap();

    let mut waited = 0;
    while engine.state() != EngineState::Mining && waited < 200 {
        thread::sleep(Duration::from_millis(10));
        waited += 1;
    }
    assert_eq!(engine.state(), EngineState::Mining);

    assert!(engine.pause());
    assert_eq!(engine.state(), EngineState::Paused);
    assert!(!engine.pause());
    assert!(engine.resume());
    assert_eq!(engine.state(), EngineState::Mining);

    engine.pause();
    engine.stop_mining();
    engine.join_worker();
    assert_eq!(engine.state(), EngineState::Ready);
    assert!(input.held_keys().is_empty());
    assert!(input.held_buttons().is_empty());

    let seen: Vec<EngineState> = events
        .try_iter()
        .filter_map(|e| match e {
            EngineEvent::StateChanged(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(
        seen,
        vec![
            EngineState::Detecting,
            EngineState::Ready,
            EngineState::Mining,
            EngineState::Paused,
            EngineState::Mining,
            EngineState::Paused,
            EngineState::Ready,
        ]
    );
}
