//! In-memory fakes of the platform seams for dry runs and tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::PlatformResult;
use crate::platform::{FrameSource, InputBackend, Key, MouseButton, WindowLocator};
use crate::types::WindowId;
use crate::vision::Frame;

/// One event observed by [`RecordingInput`]. Character releases are not
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    KeyDown(Key),
    KeyUp(Key),
    Char(char),
    Move(i32, i32),
    Mouse(MouseButton, bool),
}

#[derive(Default)]
struct Recorded {
    actions: Vec<Action>,
    held_keys: HashSet<Key>,
    held_buttons: HashSet<MouseButton>,
}

/// Records every input event and tracks what is currently held.
#[derive(Default)]
pub struct RecordingInput {
    inner: Mutex<Recorded>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.lock().actions.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().actions.clear();
    }

    pub fn held_keys(&self) -> HashSet<Key> {
        self.inner.lock().held_keys.clone()
    }

    pub fn held_buttons(&self) -> HashSet<MouseButton> {
        self.inner.lock().held_buttons.clone()
    }

    /// Number of attack-button presses.
    pub fn mine_count(&self) -> usize {
        self.inner
            .lock()
            .actions
            .iter()
            .filter(|a| **a == Action::Mouse(MouseButton::Left, true))
            .count()
    }

    /// Sum of all pointer moves.
    pub fn total_mouse_travel(&self) -> (i32, i32) {
        self.inner.lock().actions.iter().fold((0, 0), |(x, y), a| match a {
            Action::Move(dx, dy) => (x + dx, y + dy),
            _ => (x, y),
        })
    }

    /// Characters typed, in order.
    pub fn typed_text(&self) -> String {
        self.inner
            .lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        let mut inner = self.inner.lock();
        match action {
            Action::KeyDown(k) => {
                inner.held_keys.insert(k);
            }
            Action::KeyUp(k) => {
                inner.held_keys.remove(&k);
            }
            Action::Mouse(b, true) => {
                inner.held_buttons.insert(b);
            }
            Action::Mouse(b, false) => {
                inner.held_buttons.remove(&b);
            }
            _ => {}
        }
        inner.actions.push(action);
    }
}

impl InputBackend for RecordingInput {
    fn key_down(&self, key: Key) -> PlatformResult<()> {
        self.record(Action::KeyDown(key));
        Ok(())
    }

    fn key_up(&self, key: Key) -> PlatformResult<()> {
        self.record(Action::KeyUp(key));
        Ok(())
    }

    fn char_down(&self, c: char) -> PlatformResult<()> {
        self.record(Action::Char(c));
        Ok(())
    }

    fn char_up(&self, _c: char) -> PlatformResult<()> {
        Ok(())
    }

    fn mouse_move(&self, dx: i32, dy: i32) -> PlatformResult<()> {
        self.record(Action::Move(dx, dy));
        Ok(())
    }

    fn mouse_button(&self, button: MouseButton, down: bool) -> PlatformResult<()> {
        self.record(Action::Mouse(button, down));
        Ok(())
    }
}

/// Serves frames from a fixed script; the last entry repeats forever.
pub struct ScriptedFrames {
    frames: Vec<Option<Frame>>,
    captures: AtomicUsize,
}

impl ScriptedFrames {
    pub fn new(frames: Vec<Option<Frame>>) -> Self {
        Self { frames, captures: AtomicUsize::new(0) }
    }

    /// The same frame on every capture.
    pub fn constant(frame: Frame) -> Self {
        Self::new(vec![Some(frame)])
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedFrames {
    fn capture(&self, _window: WindowId) -> Option<Frame> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        let idx = n.min(self.frames.len().saturating_sub(1));
        self.frames.get(idx).cloned().flatten()
    }
}

/// A single window whose focus can be toggled from a test.
pub struct FixedWindow {
    id: WindowId,
    present: AtomicBool,
    focused: AtomicBool,
}

impl FixedWindow {
    pub fn new(id: WindowId) -> Self {
        Self { id, present: AtomicBool::new(true), focused: AtomicBool::new(true) }
    }

    /// No window to find.
    pub fn absent() -> Self {
        let w = Self::new(0);
        w.present.store(false, Ordering::SeqCst);
        w
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::SeqCst);
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }
}

impl WindowLocator for FixedWindow {
    fn find_target_window(&self) -> Option<WindowId> {
        self.present.load(Ordering::SeqCst).then_some(self.id)
    }

    fn is_window(&self, window: WindowId) -> bool {
        window == self.id && self.present.load(Ordering::SeqCst)
    }

    fn is_focused(&self, window: WindowId) -> bool {
        self.is_window(window) && self.focused.load(Ordering::SeqCst)
    }

    fn bring_to_front(&self, window: WindowId) -> bool {
        if !self.is_window(window) {
            return false;
        }
        self.focused.store(true, Ordering::SeqCst);
        true
    }

    fn title(&self, window: WindowId) -> Option<String> {
        self.is_window(window).then(|| "Minecraft 1.8.9".to_string())
    }
}
