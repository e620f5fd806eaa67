#[cfg(windows)]
pub mod win32;

use crate::window::WindowInfo;

/// Result of one activation-plus-keystroke attempt. Failures carry a reason
/// and are never surfaced as panics or errors; the scan loop logs and moves
/// on, leaving the window cooldown-eligible.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub key_sent: char,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn ok(key: char) -> Self {
        Self {
            success: true,
            key_sent: key,
            error: None,
        }
    }

    pub fn failed(key: char, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            key_sent: key,
            error: Some(reason.into()),
        }
    }
}

/// Platform seam for focusing a window and injecting exactly one keystroke.
///
/// Implementations must emit a single key-down/key-up pair for `key` and
/// nothing else. The observed tool auto-commits single-character choices;
/// an appended Enter could activate a different default.
pub trait InputBackend: Send + Sync {
    fn activate_and_send(&self, window: &WindowInfo, key: char) -> ExecutionOutcome;
}
