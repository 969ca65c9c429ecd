use std::ffi::c_void;
use std::mem::size_of;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    VIRTUAL_KEY, VK_0, VK_A, VK_D, VK_ESCAPE, VK_LCONTROL, VK_LSHIFT, VK_RETURN, VK_S,
    VK_SPACE, VK_T, VK_W,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClientRect, GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
    IsWindow, IsWindowVisible, SetForegroundWindow,
};

use crate::error::{PlatformError, PlatformResult};
use crate::logger;
use crate::types::WindowId;
use crate::vision::Frame;
use super::{title_matches, FrameSource, InputBackend, Key, MouseButton, WindowLocator};

/// SendInput + GDI backed platform.
pub struct Win32Platform;

impl Win32Platform {
    pub fn new() -> Self {
        Win32Platform
    }
}

fn hwnd(id: WindowId) -> HWND {
    HWND(id as usize as *mut c_void)
}

fn vk(key: Key) -> VIRTUAL_KEY {
    match key {
        Key::W => VK_W,
        Key::A => VK_A,
        Key::S => VK_S,
        Key::D => VK_D,
        Key::T => VK_T,
        Key::Space => VK_SPACE,
        Key::LShift => VK_LSHIFT,
        Key::LCtrl => VK_LCONTROL,
        Key::Escape => VK_ESCAPE,
        Key::Enter => VK_RETURN,
        Key::Digit(n) => VIRTUAL_KEY(VK_0.0 + n.min(9) as u16),
    }
}

fn send(input: INPUT) -> PlatformResult<()> {
    let sent = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
    if sent == 1 {
        Ok(())
    } else {
        Err(PlatformError::InjectionFailed(windows::core::Error::from_win32().to_string()))
    }
}

fn keyboard(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT { wVk: vk, wScan: scan, dwFlags: flags, time: 0, dwExtraInfo: 0 },
        },
    }
}

fn mouse(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT { dx, dy, mouseData: 0, dwFlags: flags, time: 0, dwExtraInfo: 0 },
        },
    }
}

impl InputBackend for Win32Platform {
    fn key_down(&self, key: Key) -> PlatformResult<()> {
        send(keyboard(vk(key), 0, KEYBD_EVENT_FLAGS(0)))
    }

    fn key_up(&self, key: Key) -> PlatformResult<()> {
        send(keyboard(vk(key), 0, KEYEVENTF_KEYUP))
    }

    fn char_down(&self, c: char) -> PlatformResult<()> {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            send(keyboard(VIRTUAL_KEY(0), *unit, KEYEVENTF_UNICODE))?;
        }
        Ok(())
    }

    fn char_up(&self, c: char) -> PlatformResult<()> {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            send(keyboard(VIRTUAL_KEY(0), *unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP))?;
        }
        Ok(())
    }

    fn mouse_move(&self, dx: i32, dy: i32) -> PlatformResult<()> {
        send(mouse(dx, dy, MOUSEEVENTF_MOVE))
    }

    fn mouse_button(&self, button: MouseButton, down: bool) -> PlatformResult<()> {
        let flags = match (button, down) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        };
        send(mouse(0, 0, flags))
    }
}

impl FrameSource for Win32Platform {
    fn capture(&self, window: WindowId) -> Option<Frame> {
        match capture_client(hwnd(window)) {
            Ok(frame) => Some(frame),
            Err(e) => {
                logger::warn_p("win32", &e.to_string());
                None
            }
        }
    }
}

/// BitBlt the client area into a memory DC and read it back as a 32-bit
/// bottom-up DIB. Every GDI object is released on all paths.
fn capture_client(hwnd: HWND) -> PlatformResult<Frame> {
    let mut rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut rect) }
        .map_err(|e| PlatformError::CaptureFailed(e.to_string()))?;
    let (width, height) = (rect.right - rect.left, rect.bottom - rect.top);
    if width <= 0 || height <= 0 {
        return Err(PlatformError::CaptureFailed(format!("empty client area {}x{}", width, height)));
    }

    unsafe {
        let hdc_window = GetDC(hwnd);
        if hdc_window.is_invalid() {
            return Err(PlatformError::CaptureFailed("GetDC".into()));
        }
        let hdc_mem = CreateCompatibleDC(hdc_window);
        let bitmap = CreateCompatibleBitmap(hdc_window, width, height);
        let previous = SelectObject(hdc_mem, bitmap);

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: height, // positive = bottom-up
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut pixels = vec![0u8; width as usize * height as usize * 4];

        let result = BitBlt(hdc_mem, 0, 0, width, height, hdc_window, 0, 0, SRCCOPY)
            .map_err(|e| PlatformError::CaptureFailed(e.to_string()))
            .and_then(|_| {
                let lines = GetDIBits(
                    hdc_mem,
                    bitmap,
                    0,
                    height as u32,
                    Some(pixels.as_mut_ptr() as *mut c_void),
                    &mut info,
                    DIB_RGB_COLORS,
                );
                if lines == 0 {
                    Err(PlatformError::CaptureFailed("GetDIBits".into()))
                } else {
                    Ok(())
                }
            });

        SelectObject(hdc_mem, previous);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(hdc_mem);
        ReleaseDC(hwnd, hdc_window);

        result.map(|_| Frame::from_bgra_bottom_up(pixels, width as u32, height as u32))
    }
}

fn window_title(hwnd: HWND) -> Option<String> {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return None;
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buf);
        if copied <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..copied as usize]))
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let found = &mut *(lparam.0 as *mut Vec<(WindowId, String)>);
    if IsWindowVisible(hwnd).as_bool() {
        if let Some(title) = window_title(hwnd) {
            if title_matches(&title) {
                found.push((hwnd.0 as usize as WindowId, title));
            }
        }
    }
    BOOL(1)
}

impl WindowLocator for Win32Platform {
    fn find_target_window(&self) -> Option<WindowId> {
        let mut found: Vec<(WindowId, String)> = Vec::new();
        let result = unsafe {
            EnumWindows(Some(collect_window), LPARAM(&mut found as *mut _ as isize))
        };
        if let Err(e) = result {
            logger::warn_p("win32", &format!("EnumWindows failed: {}", e));
        }
        let (id, title) = found.into_iter().next()?;
        logger::info_p("win32", &format!("found window: \"{}\" (id: {})", title, id));
        Some(id)
    }

    fn is_window(&self, window: WindowId) -> bool {
        window != 0 && unsafe { IsWindow(hwnd(window)) }.as_bool()
    }

    fn is_focused(&self, window: WindowId) -> bool {
        self.is_window(window) && unsafe { GetForegroundWindow() } == hwnd(window)
    }

    fn bring_to_front(&self, window: WindowId) -> bool {
        self.is_window(window) && unsafe { SetForegroundWindow(hwnd(window)) }.as_bool()
    }

    fn title(&self, window: WindowId) -> Option<String> {
        if !self.is_window(window) {
            return None;
        }
        window_title(hwnd(window))
    }
}
