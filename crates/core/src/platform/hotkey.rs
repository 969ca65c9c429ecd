use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Latched global hotkey presses, polled and cleared by the UI loop.
#[derive(Debug, Clone, Default)]
pub struct HotkeyFlags {
    /// F6: start or stop mining.
    pub toggle: Arc<AtomicBool>,
    /// F8: emergency stop.
    pub emergency: Arc<AtomicBool>,
}

impl HotkeyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_toggle(&self) -> bool {
        self.toggle.swap(false, Ordering::AcqRel)
    }

    pub fn take_emergency(&self) -> bool {
        self.emergency.swap(false, Ordering::AcqRel)
    }
}

/// Start a background thread that listens for the global hotkeys F6 and F8.
#[cfg(target_os = "windows")]
pub fn start_hotkey_listener(flags: HotkeyFlags) {
    use std::ffi::c_void;

    type HWND = *mut c_void;
    type BOOL = i32;
    type UINT = u32;
    type WPARAM = usize;
    type LPARAM = isize;
    type DWORD = u32;
    type LONG = i32;

    #[repr(C)]
    struct POINT {
        x: LONG,
        y: LONG,
    }

    #[repr(C)]
    struct MSG {
        hwnd: HWND,
        message: UINT,
        w_param: WPARAM,
        l_param: LPARAM,
        time: DWORD,
        pt: POINT,
    }

    const MOD_NOREPEAT: u32 = 0x4000;
    const VK_F6: u32 = 0x75;
    const VK_F8: u32 = 0x77;
    const WM_HOTKEY: u32 = 0x0312;
    const TOGGLE_ID: i32 = 1;
    const EMERGENCY_ID: i32 = 2;

    extern "system" {
        fn RegisterHotKey(hwnd: HWND, id: i32, fs_modifiers: UINT, vk: UINT) -> BOOL;
        fn GetMessageW(
            msg: *mut MSG,
            hwnd: HWND,
            msg_filter_min: UINT,
            msg_filter_max: UINT,
        ) -> BOOL;
    }

    std::thread::spawn(move || {
        unsafe {
            // Hotkeys belong to the registering thread, so register here.
            for (id, vk, name) in [(TOGGLE_ID, VK_F6, "F6"), (EMERGENCY_ID, VK_F8, "F8")] {
                if RegisterHotKey(std::ptr::null_mut(), id, MOD_NOREPEAT, vk) == 0 {
                    crate::logger::error(&format!(
                        "failed to register global hotkey {}, another application may have claimed it",
                        name
                    ));
                } else {
                    crate::logger::info(&format!("global hotkey {} registered", name));
                }
            }

            let mut msg: MSG = std::mem::zeroed();
            // GetMessageW blocks until a message arrives; returns 0 on WM_QUIT
            while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {
                if msg.message != WM_HOTKEY {
                    continue;
                }
                match msg.w_param as i32 {
                    TOGGLE_ID => flags.toggle.store(true, Ordering::Release),
                    EMERGENCY_ID => flags.emergency.store(true, Ordering::Release),
                    _ => {}
                }
            }
        }
    });
}

#[cfg(not(target_os = "windows"))]
pub fn start_hotkey_listener(_flags: HotkeyFlags) {
    // Global hotkeys not supported on this platform
}
