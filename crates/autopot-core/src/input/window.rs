//! Game window focus.
//!
//! Locates the game window by title and compares it with the current
//! foreground window.

use crate::input::WindowQuery;

/// Foreground check against the real desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForegroundWindow;

impl WindowQuery for ForegroundWindow {
    fn is_foreground(&self, window_title: &str) -> bool {
        is_foreground(window_title)
    }
}

/// Whether the top-level window titled `window_title` currently has focus.
///
/// A missing window counts as not focused.
#[cfg(target_os = "windows")]
pub fn is_foreground(window_title: &str) -> bool {
    use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetForegroundWindow};
    use windows::core::{HSTRING, PCWSTR};

    let title = HSTRING::from(window_title);
    // SAFETY: FindWindowW only reads the two string arguments; a null class name
    // matches any class.
    let target = match unsafe { FindWindowW(PCWSTR::null(), &title) } {
        Ok(hwnd) if !hwnd.is_invalid() => hwnd,
        _ => return false,
    };

    // SAFETY: GetForegroundWindow is always safe to call.
    let foreground = unsafe { GetForegroundWindow() };
    foreground == target
}

#[cfg(not(target_os = "windows"))]
pub fn is_foreground(_window_title: &str) -> bool {
    false
}
