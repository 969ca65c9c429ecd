use crate::error::PlatformResult;
use crate::logger;
use crate::types::WindowId;
use crate::vision::Frame;
use super::{FrameSource, InputBackend, Key, MouseButton, WindowLocator};

const STUB_WINDOW: WindowId = 30001;

/// Dry-run backend: every call is logged, nothing reaches the OS.
///
/// A single always-focused window is "found" so the engine can be driven end
/// to end; capture yields nothing, so SmartMining just backs off.
pub struct StubPlatform;

impl StubPlatform {
    pub fn new() -> Self {
        StubPlatform
    }
}

impl Default for StubPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for StubPlatform {
    fn key_down(&self, key: Key) -> PlatformResult<()> {
        logger::info_p("stub", &format!("key_down({:?})", key));
        Ok(())
    }

    fn key_up(&self, key: Key) -> PlatformResult<()> {
        logger::info_p("stub", &format!("key_up({:?})", key));
        Ok(())
    }

    fn char_down(&self, c: char) -> PlatformResult<()> {
        logger::info_p("stub", &format!("char({:?})", c));
        Ok(())
    }

    fn char_up(&self, _c: char) -> PlatformResult<()> {
        Ok(())
    }

    fn mouse_move(&self, dx: i32, dy: i32) -> PlatformResult<()> {
        logger::info_p("stub", &format!("mouse_move({}, {})", dx, dy));
        Ok(())
    }

    fn mouse_button(&self, button: MouseButton, down: bool) -> PlatformResult<()> {
        let dir = if down { "down" } else { "up" };
        logger::info_p("stub", &format!("mouse_{}({:?})", dir, button));
        Ok(())
    }
}

impl FrameSource for StubPlatform {
    fn capture(&self, window: WindowId) -> Option<Frame> {
        logger::info_p("stub", &format!("capture({})", window));
        None
    }
}

impl WindowLocator for StubPlatform {
    fn find_target_window(&self) -> Option<WindowId> {
        logger::info_p("stub", "find_target_window()");
        Some(STUB_WINDOW)
    }

    fn is_window(&self, window: WindowId) -> bool {
        window == STUB_WINDOW
    }

    fn is_focused(&self, window: WindowId) -> bool {
        window == STUB_WINDOW
    }

    fn bring_to_front(&self, window: WindowId) -> bool {
        logger::info_p("stub", &format!("bring_to_front({})", window));
        window == STUB_WINDOW
    }

    fn title(&self, window: WindowId) -> Option<String> {
        (window == STUB_WINDOW).then(|| "Minecraft (stub)".to_string())
    }
}
