//! Timed synthetic input built on an [`InputBackend`].
//!
//! Every wait goes through the run token so a cancel cuts it short, and
//! every wait that models human timing goes through the jitter source.
//! Backend failures are logged and swallowed: a missed event is cheaper than
//! a retried one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ChatSpeed, ChatTiming, MoveMode};
use crate::control::RunToken;
use crate::error::{PlatformResult, RunResult};
use crate::logger;
use crate::platform::{InputBackend, Key, MouseButton};
use crate::sleep::{self, Jitter, RandomJitter};

/// Settle time after each key event.
const KEY_SETTLE_MS: u64 = 15;
/// Settle time after each pointer move.
const MOVE_SETTLE_MS: u64 = 20;
/// Settle time after releasing a mined block.
const MINE_SETTLE_MS: u64 = 50;
const KEY_PRESS_MS: u64 = 80;
const SLOT_PRESS_MS: u64 = 50;
const SUBMIT_PRESS_MS: u64 = 50;

const LOOK_STEP_PX: i32 = 20;
/// Pointer travel for a quarter turn at default sensitivity.
pub const QUARTER_TURN_PX: i32 = 480;
const QUARTER_TURN_STEPS: i32 = 6;
pub const HALF_TURN_PX: i32 = 960;
const HALF_TURN_STEPS: i32 = 10;

/// Keys [`Actuator::release_all_keys`] lifts unconditionally.
const RELEASABLE: [Key; 7] = [Key::W, Key::A, Key::S, Key::D, Key::Space, Key::LShift, Key::LCtrl];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub fn key(self) -> Key {
        match self {
            Direction::Forward => Key::W,
            Direction::Backward => Key::S,
            Direction::Left => Key::A,
            Direction::Right => Key::D,
        }
    }
}

pub struct Actuator {
    backend: Arc<dyn InputBackend>,
    humanize: AtomicBool,
    jitter: Box<dyn Jitter>,
    time_scale: f64,
}

impl Actuator {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self {
            backend,
            humanize: AtomicBool::new(true),
            jitter: Box::new(RandomJitter),
            time_scale: 1.0,
        }
    }

    /// Replace the random source used for humanized delays.
    pub fn with_jitter(mut self, jitter: Box<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Multiply every wait by `scale`. Zero makes all waits instant.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    pub fn set_humanize(&self, on: bool) {
        self.humanize.store(on, Ordering::Relaxed);
    }

    pub fn humanize(&self) -> bool {
        self.humanize.load(Ordering::Relaxed)
    }

    // ── waits ──

    /// Humanized wait: ±25% when humanize is on.
    pub fn pause(&self, token: &RunToken, ms: u64) -> RunResult<()> {
        let ms = sleep::jittered_ms(ms, self.humanize(), self.jitter.as_ref());
        token.sleep(sleep::scaled(ms, self.time_scale))
    }

    /// Exact wait, for delays that model the game rather than the player
    /// (teleport warmups, countdowns).
    pub fn delay(&self, token: &RunToken, ms: u64) -> RunResult<()> {
        token.sleep(sleep::scaled(ms, self.time_scale))
    }

    fn swallow(&self, what: &str, result: PlatformResult<()>) {
        if let Err(e) = result {
            logger::warn_p("input", &format!("{} failed: {}", what, e));
        }
    }

    // ── primitives ──

    pub fn key_down(&self, token: &RunToken, key: Key) -> RunResult<()> {
        self.swallow("key_down", self.backend.key_down(key));
        self.pause(token, KEY_SETTLE_MS)
    }

    pub fn key_up(&self, token: &RunToken, key: Key) -> RunResult<()> {
        self.swallow("key_up", self.backend.key_up(key));
        self.pause(token, KEY_SETTLE_MS)
    }

    /// Tap a key, holding it `hold_ms`. The key is released even if the hold
    /// is cancelled.
    pub fn key_press(&self, token: &RunToken, key: Key, hold_ms: u64) -> RunResult<()> {
        let guard = HeldKeys::press(self, token, &[key])?;
        let held = self.pause(token, hold_ms);
        guard.release(token)?;
        held
    }

    pub fn mouse_move(&self, token: &RunToken, dx: i32, dy: i32) -> RunResult<()> {
        self.swallow("mouse_move", self.backend.mouse_move(dx, dy));
        self.pause(token, MOVE_SETTLE_MS)
    }

    pub fn left_down(&self, token: &RunToken) -> RunResult<()> {
        self.swallow("left_down", self.backend.mouse_button(MouseButton::Left, true));
        self.pause(token, KEY_SETTLE_MS)
    }

    pub fn left_up(&self, token: &RunToken) -> RunResult<()> {
        self.swallow("left_up", self.backend.mouse_button(MouseButton::Left, false));
        self.pause(token, KEY_SETTLE_MS)
    }

    pub fn right_click(&self, token: &RunToken) -> RunResult<()> {
        self.swallow("right_down", self.backend.mouse_button(MouseButton::Right, true));
        let held = self.pause(token, 50);
        self.swallow("right_up", self.backend.mouse_button(MouseButton::Right, false));
        held?;
        self.pause(token, 30)
    }

    // ── actions ──

    /// Hold the attack button for `duration_ms` (jittered), then release.
    /// The button is released on every exit path.
    pub fn mine_block(&self, token: &RunToken, duration_ms: u64) -> RunResult<()> {
        let pressed = self.left_down(token).and_then(|_| self.pause(token, duration_ms));
        self.swallow("left_up", self.backend.mouse_button(MouseButton::Left, false));
        pressed?;
        self.pause(token, KEY_SETTLE_MS)?;
        self.pause(token, MINE_SETTLE_MS)
    }

    /// Select hotbar slot 1..=9; anything else is ignored.
    pub fn select_slot(&self, token: &RunToken, slot: u8) -> RunResult<()> {
        if !(1..=9).contains(&slot) {
            return Ok(());
        }
        self.key_press(token, Key::Digit(slot), SLOT_PRESS_MS)
    }

    pub fn jump(&self, token: &RunToken) -> RunResult<()> {
        self.key_press(token, Key::Space, KEY_PRESS_MS)
    }

    pub fn move_forward(&self, token: &RunToken, duration_ms: u64) -> RunResult<()> {
        self.hold_direction(token, Direction::Forward, duration_ms, None)
    }

    pub fn move_backward(&self, token: &RunToken, duration_ms: u64) -> RunResult<()> {
        self.hold_direction(token, Direction::Backward, duration_ms, None)
    }

    pub fn move_left(&self, token: &RunToken, duration_ms: u64) -> RunResult<()> {
        self.hold_direction(token, Direction::Left, duration_ms, None)
    }

    pub fn move_right(&self, token: &RunToken, duration_ms: u64) -> RunResult<()> {
        self.hold_direction(token, Direction::Right, duration_ms, None)
    }

    /// Hold a direction key (and optionally a speed modifier pressed first)
    /// for a jittered duration. Both keys are released on every exit path.
    pub fn hold_direction(
        &self,
        token: &RunToken,
        dir: Direction,
        duration_ms: u64,
        modifier: Option<Key>,
    ) -> RunResult<()> {
        let ms = sleep::jittered_ms(duration_ms, self.humanize(), self.jitter.as_ref());
        self.hold_exact(token, dir, ms, modifier)
    }

    /// Move `blocks` blocks in `dir` at the speed of `mode`. The hold time is
    /// computed from the per-mode block speed and is not jittered.
    pub fn move_blocks(&self, token: &RunToken, dir: Direction, blocks: u32, mode: MoveMode) -> RunResult<()> {
        if blocks == 0 {
            return Ok(());
        }
        let modifier = match mode {
            MoveMode::Walk => None,
            MoveMode::Sprint => Some(Key::LCtrl),
            MoveMode::Sneak => Some(Key::LShift),
        };
        self.hold_exact(token, dir, blocks as u64 * mode.ms_per_block(), modifier)
    }

    fn hold_exact(&self, token: &RunToken, dir: Direction, ms: u64, modifier: Option<Key>) -> RunResult<()> {
        let keys: Vec<Key> = modifier.into_iter().chain(std::iter::once(dir.key())).collect();
        let guard = HeldKeys::press(self, token, &keys)?;
        let held = self.delay(token, ms);
        guard.release(token)?;
        held
    }

    // ── camera ──

    pub fn look_down(&self, token: &RunToken, pixels: i32) -> RunResult<()> {
        self.look_vertical(token, pixels)
    }

    pub fn look_up(&self, token: &RunToken, pixels: i32) -> RunResult<()> {
        self.look_vertical(token, -pixels)
    }

    fn look_vertical(&self, token: &RunToken, pixels: i32) -> RunResult<()> {
        let steps = (pixels.abs() / LOOK_STEP_PX).max(1);
        self.smooth_move(token, 0, pixels / steps, steps)
    }

    pub fn turn_left(&self, token: &RunToken) -> RunResult<()> {
        self.smooth_move(token, -QUARTER_TURN_PX / QUARTER_TURN_STEPS, 0, QUARTER_TURN_STEPS)
    }

    pub fn turn_right(&self, token: &RunToken) -> RunResult<()> {
        self.smooth_move(token, QUARTER_TURN_PX / QUARTER_TURN_STEPS, 0, QUARTER_TURN_STEPS)
    }

    pub fn turn_around(&self, token: &RunToken) -> RunResult<()> {
        self.smooth_move(token, HALF_TURN_PX / HALF_TURN_STEPS, 0, HALF_TURN_STEPS)
    }

    /// `steps` equal pointer moves of (`dx`, `dy`) each.
    pub fn smooth_move(&self, token: &RunToken, dx: i32, dy: i32, steps: i32) -> RunResult<()> {
        for _ in 0..steps {
            self.mouse_move(token, dx, dy)?;
        }
        Ok(())
    }

    // ── chat ──

    /// Open chat, type `text` and submit, at comfortable speed.
    pub fn type_chat_command(&self, token: &RunToken, text: &str) -> RunResult<()> {
        self.type_chat(token, text, ChatSpeed::Slow.timing())
    }

    /// Same as [`Actuator::type_chat_command`] with a chosen speed profile.
    pub fn type_chat_command_fast(&self, token: &RunToken, text: &str, speed: ChatSpeed) -> RunResult<()> {
        self.type_chat(token, text, speed.timing())
    }

    fn type_chat(&self, token: &RunToken, text: &str, timing: ChatTiming) -> RunResult<()> {
        // '/' opens chat with the slash already typed; anything else opens with T
        let body = match text.strip_prefix('/') {
            Some(rest) => {
                self.tap_char(token, '/', timing)?;
                rest
            }
            None => {
                self.key_press(token, Key::T, SUBMIT_PRESS_MS)?;
                text
            }
        };
        self.pause(token, timing.open_ms)?;
        for c in body.chars() {
            self.tap_char(token, c, timing)?;
            self.pause(token, timing.char_ms)?;
        }
        self.pause(token, timing.pre_submit_ms)?;
        self.key_press(token, Key::Enter, SUBMIT_PRESS_MS)?;
        self.pause(token, timing.post_submit_ms)
    }

    fn tap_char(&self, token: &RunToken, c: char, timing: ChatTiming) -> RunResult<()> {
        self.swallow("char_down", self.backend.char_down(c));
        let held = self.pause(token, KEY_SETTLE_MS.min(timing.char_ms));
        self.swallow("char_up", self.backend.char_up(c));
        held
    }

    // ── safety ──

    /// Lift every movement and modifier key and both mouse buttons. Safe to
    /// call at any time from any thread; never waits.
    pub fn release_all_keys(&self) {
        for key in RELEASABLE {
            self.swallow("key_up", self.backend.key_up(key));
        }
        self.swallow("left_up", self.backend.mouse_button(MouseButton::Left, false));
        self.swallow("right_up", self.backend.mouse_button(MouseButton::Right, false));
    }
}

/// Keys pressed in order and still held. Whatever is still held when the
/// guard drops is lifted immediately, without settle waits.
struct HeldKeys<'a> {
    actuator: &'a Actuator,
    keys: Vec<Key>,
}

impl<'a> HeldKeys<'a> {
    fn press(actuator: &'a Actuator, token: &RunToken, keys: &[Key]) -> RunResult<Self> {
        let mut guard = HeldKeys { actuator, keys: Vec::with_capacity(keys.len()) };
        for &key in keys {
            actuator.swallow("key_down", actuator.backend.key_down(key));
            guard.keys.push(key);
            actuator.pause(token, KEY_SETTLE_MS)?;
        }
        Ok(guard)
    }

    /// Release in reverse press order with normal settle waits.
    fn release(mut self, token: &RunToken) -> RunResult<()> {
        while let Some(key) = self.keys.pop() {
            self.actuator.swallow("key_up", self.actuator.backend.key_up(key));
            self.actuator.pause(token, KEY_SETTLE_MS)?;
        }
        Ok(())
    }
}

impl Drop for HeldKeys<'_> {
    fn drop(&mut self) {
        while let Some(key) = self.keys.pop() {
            self.actuator.swallow("key_up", self.actuator.backend.key_up(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleep::FixedJitter;
    use crate::testing::{Action, RecordingInput};

    fn actuator() -> (Arc<RecordingInput>, Actuator) {
        let input = Arc::new(RecordingInput::new());
        let act = Actuator::new(input.clone()).with_time_scale(0.0).with_jitter(Box::new(FixedJitter(0)));
        (input, act)
    }

    #[test]
    fn test_mine_block_presses_and_releases() {
        let (input, act) = actuator();
        act.mine_block(&RunToken::new(), 2550).unwrap();
        assert_eq!(
            input.actions(),
            vec![Action::Mouse(MouseButton::Left, true), Action::Mouse(MouseButton::Left, false)]
        );
    }

    #[test]
    fn test_mine_block_releases_when_cancelled() {
        let (input, act) = actuator();
        let token = RunToken::new();
        token.cancel();
        assert!(act.mine_block(&token, 2550).unwrap_err().is_cancelled());
        assert!(input.held_buttons().is_empty());
    }

    #[test]
    fn test_sprint_modifier_wraps_direction() {
        let (input, act) = actuator();
        act.move_blocks(&RunToken::new(), Direction::Backward, 2, MoveMode::Sprint).unwrap();
        assert_eq!(
            input.actions(),
            vec![
                Action::KeyDown(Key::LCtrl),
                Action::KeyDown(Key::S),
                Action::KeyUp(Key::S),
                Action::KeyUp(Key::LCtrl),
            ]
        );
    }

    #[test]
    fn test_modifier_released_on_cancel() {
        let (input, act) = actuator();
        let token = RunToken::new();
        token.cancel();
        let err = act.hold_direction(&token, Direction::Left, 500, Some(Key::LShift)).unwrap_err();
        assert!(err.is_cancelled());
        assert!(input.held_keys().is_empty());
    }

    #[test]
    fn test_slash_command_typing() {
        let (input, act) = actuator();
        act.type_chat_command(&RunToken::new(), "/home a").unwrap();
        let typed: String = input
            .actions()
            .iter()
            .filter_map(|a| match a {
                Action::Char(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(typed, "/home a");
        assert_eq!(input.actions().last(), Some(&Action::KeyUp(Key::Enter)));
        assert!(!input.actions().contains(&Action::KeyDown(Key::T)));
    }

    #[test]
    fn test_plain_chat_opens_with_t() {
        let (input, act) = actuator();
        act.type_chat_command_fast(&RunToken::new(), "hi", ChatSpeed::Ultra).unwrap();
        assert_eq!(input.actions()[0], Action::KeyDown(Key::T));
    }

    #[test]
    fn test_release_all_is_idempotent() {
        let (input, act) = actuator();
        input.key_down(Key::W).unwrap();
        input.mouse_button(MouseButton::Left, true).unwrap();
        act.release_all_keys();
        assert!(input.held_keys().is_empty());
        assert!(input.held_buttons().is_empty());
        act.release_all_keys();
        assert!(input.held_keys().is_empty());
        assert!(input.held_buttons().is_empty());
    }

    #[test]
    fn test_turns_sum_to_full_travel() {
        let (input, act) = actuator();
        act.turn_around(&RunToken::new()).unwrap();
        assert_eq!(input.total_mouse_travel(), (HALF_TURN_PX, 0));
    }

    #[test]
    fn test_quarter_turns_cancel_out() {
        let (input, act) = actuator();
        let token = RunToken::new();
        act.turn_left(&token).unwrap();
        assert_eq!(input.total_mouse_travel(), (-QUARTER_TURN_PX, 0));
        act.turn_right(&token).unwrap();
        act.turn_right(&token).unwrap();
        assert_eq!(input.total_mouse_travel(), (QUARTER_TURN_PX, 0));
    }

    #[test]
    fn test_jump_and_right_click_release() {
        let (input, act) = actuator();
        let token = RunToken::new();
        act.jump(&token).unwrap();
        act.right_click(&token).unwrap();
        assert_eq!(
            input.actions(),
            vec![
                Action::KeyDown(Key::Space),
                Action::KeyUp(Key::Space),
                Action::Mouse(MouseButton::Right, true),
                Action::Mouse(MouseButton::Right, false),
            ]
        );
        assert!(input.held_keys().is_empty());
        assert!(input.held_buttons().is_empty());
    }

    #[test]
    fn test_plain_moves_hold_one_key() {
        let (input, act) = actuator();
        let token = RunToken::new();
        act.move_forward(&token, 100).unwrap();
        act.move_backward(&token, 100).unwrap();
        act.move_left(&token, 100).unwrap();
        act.move_right(&token, 100).unwrap();
        let downs: Vec<Key> = input
            .actions()
            .iter()
            .filter_map(|a| match a {
                Action::KeyDown(k) => Some(*k),
                _ => None,
            })
            .collect();
        assert_eq!(downs, vec![Key::W, Key::S, Key::A, Key::D]);
        assert!(input.held_keys().is_empty());
    }

    #[test]
    fn test_invalid_slot_ignored() {
        let (input, act) = actuator();
        act.select_slot(&RunToken::new(), 0).unwrap();
        act.select_slot(&RunToken::new(), 10).unwrap();
        assert!(input.actions().is_empty());
    }
}
