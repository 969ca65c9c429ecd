pub mod hotkey;
pub mod stub;

#[cfg(target_os = "windows")]
pub mod win32;

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::error::PlatformResult;
use crate::logger;
use crate::types::WindowId;
use crate::vision::Frame;

/// Keys the actuator needs. Hotbar digits are `Digit(1..=9)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    T,
    Space,
    LShift,
    LCtrl,
    Escape,
    Enter,
    Digit(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Raw synthetic input. Every call is one OS event with no waiting.
pub trait InputBackend: Send + Sync {
    fn key_down(&self, key: Key) -> PlatformResult<()>;
    fn key_up(&self, key: Key) -> PlatformResult<()>;
    /// Unicode character event, independent of keyboard layout.
    fn char_down(&self, c: char) -> PlatformResult<()>;
    fn char_up(&self, c: char) -> PlatformResult<()>;
    /// Relative pointer motion (raw mickeys, what the game's camera reads).
    fn mouse_move(&self, dx: i32, dy: i32) -> PlatformResult<()>;
    fn mouse_button(&self, button: MouseButton, down: bool) -> PlatformResult<()>;
}

/// Captures the client area of a window. `None` for minimized, closed or
/// exclusive-fullscreen windows.
pub trait FrameSource: Send + Sync {
    fn capture(&self, window: WindowId) -> Option<Frame>;
}

pub trait WindowLocator: Send + Sync {
    fn find_target_window(&self) -> Option<WindowId>;
    fn is_window(&self, window: WindowId) -> bool;
    fn is_focused(&self, window: WindowId) -> bool;
    fn bring_to_front(&self, window: WindowId) -> bool;
    fn title(&self, window: WindowId) -> Option<String>;
}

/// The three OS seams bundled together.
#[derive(Clone)]
pub struct Platform {
    pub input: Arc<dyn InputBackend>,
    pub frames: Arc<dyn FrameSource>,
    pub windows: Arc<dyn WindowLocator>,
}

impl Platform {
    pub fn new(
        input: Arc<dyn InputBackend>,
        frames: Arc<dyn FrameSource>,
        windows: Arc<dyn WindowLocator>,
    ) -> Self {
        Self { input, frames, windows }
    }
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Platform {
    logger::register_prefix("engine", logger::COLOR_GREEN);
    logger::register_prefix("input", logger::COLOR_GRAY);
    if force_stub {
        return stub_platform();
    }
    #[cfg(target_os = "windows")]
    {
        logger::register_prefix("win32", logger::COLOR_BLUE);
        let backend = Arc::new(win32::Win32Platform::new());
        return Platform::new(backend.clone(), backend.clone(), backend);
    }
    #[cfg(not(target_os = "windows"))]
    {
        stub_platform()
    }
}

fn stub_platform() -> Platform {
    logger::register_prefix("stub", logger::COLOR_GRAY);
    let stub = Arc::new(stub::StubPlatform::new());
    Platform::new(stub.clone(), stub.clone(), stub)
}

/// Whether a window title looks like the game client itself rather than its
/// launcher or updater. Case-insensitive.
pub fn title_matches(title: &str) -> bool {
    static FILTER: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    let filter = FILTER.get_or_init(|| {
        let include = Regex::new("(?i)minecraft");
        let exclude = Regex::new("(?i)launcher|updater");
        match (include, exclude) {
            (Ok(i), Ok(e)) => Some((i, e)),
            (Err(e), _) | (_, Err(e)) => {
                logger::error(&format!("invalid window title filter: {}", e));
                None
            }
        }
    });
    match filter {
        Some((include, exclude)) => include.is_match(title) && !exclude.is_match(title),
        None => false,
    }
}
