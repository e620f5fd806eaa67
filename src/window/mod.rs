#[cfg(windows)]
pub mod win32;

use anyhow::Result;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::config::WindowFilterConfig;

/// Opaque OS window identifier. On Win32 this is the HWND value.
pub type WindowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Metadata for one on-screen window, borrowed fresh from the OS each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub class_name: String,
    pub bounds: WindowBounds,
    pub visible: bool,
    pub minimized: bool,
    /// WS_EX_TOOLWINDOW-style bit; such windows never host a prompt.
    pub tool_window: bool,
    /// WS_EX_NOACTIVATE-style bit; these reject focus and key input.
    pub no_activate: bool,
}

/// A bitmap snapshot of one window, owned by the stage processing it.
pub struct CapturedFrame {
    pub image: DynamicImage,
    pub window: WindowInfo,
    pub captured_at: DateTime<Utc>,
}

/// Platform seam for window discovery and pixel capture. The detection core
/// only sees this trait, so it stays unit-testable without an OS.
pub trait WindowService: Send + Sync {
    /// Enumerate current top-level windows. Enumeration failure yields an
    /// empty list; the scan loop must tolerate zero candidates.
    fn enumerate(&self) -> Vec<WindowInfo>;

    /// Capture the window's current pixels without forcing repaint or focus.
    /// `Ok(None)` when the handle went stale or the window shrank below a
    /// usable size since discovery.
    fn capture(&self, id: WindowId) -> Result<Option<CapturedFrame>>;

    fn is_valid(&self, id: WindowId) -> bool;
}

/// Position used by the OS to park restored-later placeholder windows.
const PARKED_COORD: i32 = -32000;

/// Class-name substrings that mark system surfaces regardless of the
/// configured exact-class denylist.
const SYSTEM_CLASS_KEYWORDS: [&str; 5] = ["notification", "toast", "windows.ui", "xaml", "dwm"];

/// Static, side-effect-free filter deciding which windows are worth OCR.
#[derive(Debug, Clone)]
pub struct WindowFilter {
    config: WindowFilterConfig,
}

impl WindowFilter {
    pub fn new(config: WindowFilterConfig) -> Self {
        Self { config }
    }

    /// A window qualifies when it is visible (or minimized but restorable),
    /// titled, not a system surface, not excluded by title keyword, large
    /// enough to render a prompt, and able to take activation.
    pub fn is_candidate(&self, window: &WindowInfo) -> bool {
        if !window.visible && !window.minimized {
            return false;
        }
        if window.title.is_empty() {
            return false;
        }
        if self.is_system_window(window) {
            return false;
        }
        if self.is_excluded_title(&window.title) {
            return false;
        }
        if window.bounds.width < self.config.min_width
            || window.bounds.height < self.config.min_height
        {
            return false;
        }
        true
    }

    fn is_system_window(&self, window: &WindowInfo) -> bool {
        if self
            .config
            .system_classes
            .iter()
            .any(|class| class == &window.class_name)
        {
            return true;
        }

        let class_lower = window.class_name.to_lowercase();
        if SYSTEM_CLASS_KEYWORDS
            .iter()
            .any(|kw| class_lower.contains(kw))
        {
            return true;
        }

        if window.tool_window || window.no_activate {
            return true;
        }

        // Minimized windows get parked far off-screen; a window that reports
        // that position while "visible" is a shell artifact.
        window.bounds.x == PARKED_COORD && window.bounds.y == PARKED_COORD
    }

    fn is_excluded_title(&self, title: &str) -> bool {
        let title_lower = title.to_lowercase();
        self.config
            .exclude_keywords
            .iter()
            .any(|kw| title_lower.contains(kw.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(title: &str, class: &str, width: u32, height: u32) -> WindowInfo {
        WindowInfo {
            id: 1,
            title: title.to_string(),
            class_name: class.to_string(),
            bounds: WindowBounds {
                x: 10,
                y: 10,
                width,
                height,
            },
            visible: true,
            minimized: false,
            tool_window: false,
            no_activate: false,
        }
    }

    fn filter() -> WindowFilter {
        WindowFilter::new(WindowFilterConfig::default())
    }

    #[test]
    fn accepts_plain_terminal_window() {
        assert!(filter().is_candidate(&window("claude - ~/project", "ConsoleWindowClass", 800, 600)));
    }

    #[test]
    fn rejects_empty_title() {
        assert!(!filter().is_candidate(&window("", "ConsoleWindowClass", 800, 600)));
    }

    #[test]
    fn rejects_invisible_non_minimized() {
        let mut w = window("claude", "ConsoleWindowClass", 800, 600);
        w.visible = false;
        assert!(!filter().is_candidate(&w));
        w.minimized = true;
        assert!(filter().is_candidate(&w));
    }

    #[test]
    fn rejects_system_class_exact_and_keyword() {
        assert!(!filter().is_candidate(&window("tray", "Shell_TrayWnd", 800, 600)));
        assert!(!filter().is_candidate(&window("x", "Some.Xaml.Host", 800, 600)));
        assert!(!filter().is_candidate(&window("x", "ToastChildWindowClass", 800, 600)));
    }

    #[test]
    fn rejects_excluded_title_keywords() {
        assert!(!filter().is_candidate(&window("docs - Google Chrome", "Chrome_WidgetWin_1", 800, 600)));
        assert!(!filter().is_candidate(&window("budget.xlsx - Excel", "XLMAIN", 800, 600)));
    }

    #[test]
    fn rejects_undersized_windows() {
        assert!(!filter().is_candidate(&window("claude", "ConsoleWindowClass", 99, 600)));
        assert!(!filter().is_candidate(&window("claude", "ConsoleWindowClass", 800, 19)));
        assert!(filter().is_candidate(&window("claude", "ConsoleWindowClass", 100, 20)));
    }

    #[test]
    fn rejects_style_bits_and_parked_position() {
        let mut w = window("palette", "SomeClass", 800, 600);
        w.tool_window = true;
        assert!(!filter().is_candidate(&w));

        let mut w = window("overlay", "SomeClass", 800, 600);
        w.no_activate = true;
        assert!(!filter().is_candidate(&w));

        let mut w = window("parked", "SomeClass", 800, 600);
        w.bounds.x = -32000;
        w.bounds.y = -32000;
        assert!(!filter().is_candidate(&w));
    }
}
