//! Win32 input backend: foreground activation with an Alt-nudge fallback
//! for focus-steal protection, then a single SendInput down/up pair.

use std::thread;
use std::time::Duration;

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, VIRTUAL_KEY, VK_MENU,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, IsIconic, IsWindow, SetForegroundWindow, ShowWindow, SW_RESTORE, SW_SHOW,
};

use crate::config::TimingConfig;
use crate::window::WindowInfo;

use super::{ExecutionOutcome, InputBackend};

pub struct Win32InputBackend {
    activation_delay: Duration,
    key_delay: Duration,
}

impl Win32InputBackend {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            activation_delay: Duration::from_millis(timing.activation_delay_ms),
            key_delay: Duration::from_millis(timing.key_delay_ms),
        }
    }

    fn activate(&self, handle: HWND) -> bool {
        unsafe {
            if IsIconic(handle).as_bool() {
                let _ = ShowWindow(handle, SW_RESTORE);
                thread::sleep(Duration::from_millis(200));
            }
            let _ = ShowWindow(handle, SW_SHOW);
            thread::sleep(Duration::from_millis(100));

            if !SetForegroundWindow(handle).as_bool() {
                // Focus-steal protection denies cold SetForegroundWindow
                // calls; a neutral Alt tap makes this thread the last input
                // source and lifts the restriction.
                send_key_pair(VK_MENU, Duration::from_millis(50));
                thread::sleep(Duration::from_millis(50));
                let _ = SetForegroundWindow(handle);
            }
            thread::sleep(Duration::from_millis(200));

            GetForegroundWindow() == handle
        }
    }
}

impl InputBackend for Win32InputBackend {
    fn activate_and_send(&self, window: &WindowInfo, key: char) -> ExecutionOutcome {
        let handle = HWND(window.id as isize as *mut _);

        unsafe {
            if !IsWindow(handle).as_bool() {
                return ExecutionOutcome::failed(key, "window no longer exists");
            }
        }

        if !self.activate(handle) {
            return ExecutionOutcome::failed(key, "failed to bring window to foreground");
        }

        thread::sleep(self.activation_delay);

        let Some(vk) = char_to_vk(key) else {
            return ExecutionOutcome::failed(key, format!("no virtual key for {key:?}"));
        };

        // One down/up pair and nothing more; the prompt auto-commits.
        unsafe {
            send_key_pair(vk, self.key_delay);
        }
        ExecutionOutcome::ok(key)
    }
}

fn char_to_vk(key: char) -> Option<VIRTUAL_KEY> {
    let upper = key.to_ascii_uppercase();
    if upper.is_ascii_digit() || upper.is_ascii_uppercase() {
        Some(VIRTUAL_KEY(upper as u16))
    } else {
        None
    }
}

unsafe fn send_key_pair(vk: VIRTUAL_KEY, between: Duration) {
    send_event(vk, KEYBD_EVENT_FLAGS(0));
    thread::sleep(between);
    send_event(vk, KEYEVENTF_KEYUP);
}

unsafe fn send_event(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) {
    let input = [INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }];
    SendInput(&input, std::mem::size_of::<INPUT>() as i32);
}
