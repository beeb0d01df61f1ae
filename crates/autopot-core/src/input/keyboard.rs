//! Keyboard input simulation via SendInput API.
//!
//! Uses scan codes with `KEYEVENTF_SCANCODE` so DirectInput-based games
//! recognise the press.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::input::InputSink;

/// How long the key is held between down and up events.
pub const KEY_HOLD: Duration = Duration::from_millis(20);

/// A key the potion can be bound to, stored as a Windows virtual-key code.
///
/// Accepted names: `0`-`9`, `a`-`z`, `f1`-`f12`, `num0`-`num9`, `space`,
/// `enter`, `tab` (case-insensitive). None of these are extended keys, so
/// `KEYEVENTF_EXTENDEDKEY` is never needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotionKey {
    name: String,
    virtual_key: u16,
}

impl PotionKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn virtual_key(&self) -> u16 {
        self.virtual_key
    }
}

impl FromStr for PotionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let invalid = || Error::InvalidConfig(format!("Unsupported potion key: '{}'", s));

        let virtual_key = match name.as_str() {
            "space" => 0x20,
            "enter" => 0x0D,
            "tab" => 0x09,
            _ if name.len() == 1 => {
                let c = name.as_bytes()[0];
                match c {
                    b'0'..=b'9' => c as u16,
                    b'a'..=b'z' => c.to_ascii_uppercase() as u16,
                    _ => return Err(invalid()),
                }
            }
            _ => {
                if let Some(n) = name.strip_prefix("num") {
                    match n.parse::<u16>() {
                        Ok(d) if d <= 9 => 0x60 + d,
                        _ => return Err(invalid()),
                    }
                } else if let Some(n) = name.strip_prefix('f') {
                    match n.parse::<u16>() {
                        Ok(d) if (1..=12).contains(&d) => 0x70 + d - 1,
                        _ => return Err(invalid()),
                    }
                } else {
                    return Err(invalid());
                }
            }
        };

        Ok(Self { name, virtual_key })
    }
}

impl fmt::Display for PotionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Sends key presses to whatever window has focus.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardInput;

impl InputSink for KeyboardInput {
    fn send_key(&self, key: &PotionKey) -> Result<()> {
        send_key_press(key, KEY_HOLD)
    }
}

/// Send a key press (down + delay + up) for the given key.
#[cfg(target_os = "windows")]
pub fn send_key_press(key: &PotionKey, hold: Duration) -> Result<()> {
    use windows::Win32::UI::Input::KeyboardAndMouse::*;

    // SAFETY: MapVirtualKeyW is a pure lookup with no pointer arguments.
    let scan = unsafe { MapVirtualKeyW(key.virtual_key() as u32, MAPVK_VK_TO_VSC) } as u16;

    let flags_down = KEYEVENTF_SCANCODE;
    let flags_up = KEYEVENTF_SCANCODE | KEYEVENTF_KEYUP;

    let event = |flags| INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };

    // SAFETY: SendInput is called with properly initialized INPUT structs.
    // The array contains exactly the number of elements indicated by the count parameter.
    let sent = unsafe { SendInput(&[event(flags_down)], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        return Err(Error::InputFailed(format!(
            "SendInput (key down) failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    std::thread::sleep(hold);

    let sent = unsafe { SendInput(&[event(flags_up)], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        return Err(Error::InputFailed(format!(
            "SendInput (key up) failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn send_key_press(_key: &PotionKey, _hold: Duration) -> Result<()> {
    Err(Error::InputFailed("SendInput is only supported on Windows".to_string()))
}
