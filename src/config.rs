use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Timing knobs for the scan loop and the execution backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds between scan cycles.
    pub scan_interval_secs: u64,
    /// Seconds a window stays ineligible after an action.
    pub cooldown_secs: u64,
    /// Seconds to wait after bringing a window to the foreground.
    pub activation_delay_ms: u64,
    /// Milliseconds between key down and key up.
    pub key_delay_ms: u64,
    /// Upper bound on a single window's capture + recognition work.
    pub capture_timeout_secs: u64,
    /// Seconds between `[status]` heartbeat lines.
    pub status_interval_secs: u64,
    /// Backoff after a cycle-level failure.
    pub error_backoff_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 10,
            cooldown_secs: 20,
            activation_delay_ms: 300,
            key_delay_ms: 50,
            capture_timeout_secs: 10,
            status_interval_secs: 30,
            error_backoff_secs: 3,
        }
    }
}

/// Static window filtering rules. Windows failing any rule are never
/// captured or recognized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowFilterConfig {
    /// Title substrings (lowercased) that exclude a window.
    pub exclude_keywords: Vec<String>,
    /// Exact OS window classes that mark system surfaces.
    pub system_classes: Vec<String>,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for WindowFilterConfig {
    fn default() -> Self {
        Self {
            exclude_keywords: [
                "auto approval complete",
                "chrome",
                "google chrome",
                "nvidia geforce",
                "program manager",
                "microsoft text input",
                "settings",
                "powerpoint",
                "ppt",
                "microsoft powerpoint",
                "hwp",
                ".hwp",
                "hancom",
                "hanword",
                "excel",
                "microsoft excel",
                ".xlsx",
                ".xls",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            system_classes: [
                "Windows.UI.Core.CoreWindow",
                "Shell_TrayWnd",
                "NotifyIconOverflowWindow",
                "Windows.UI.Input.InputSite.WindowClass",
                "ApplicationFrameWindow",
                "Windows.Internal.Shell.TabProxyWindow",
                "ImmersiveLauncher",
                "MultitaskingViewFrame",
                "ForegroundStaging",
                "Dwm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_width: 100,
            min_height: 20,
        }
    }
}

/// Recognition engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path to the tesseract executable, or bare "tesseract" for PATH lookup.
    pub tesseract_path: String,
    pub language: String,
    /// Images narrower than this are upscaled before recognition.
    pub min_scale_width: u32,
    /// Contrast boost applied during preprocessing.
    pub contrast_boost: f32,
    /// Thorough mode retries on the bottom half below this character count.
    pub min_chars_before_retry: usize,
    /// Character whitelist applied in fast mode.
    pub fast_mode_whitelist: String,
    /// Hamming distance at which a frame counts as changed.
    pub phash_change_threshold: u32,
    /// Re-recognize an unchanged frame after this many seconds.
    pub ocr_refresh_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            min_scale_width: 1200,
            contrast_boost: 2.0,
            min_chars_before_retry: 50,
            fast_mode_whitelist:
                "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.,?!():-' "
                    .to_string(),
            phash_change_threshold: 8,
            ocr_refresh_secs: 20,
        }
    }
}

/// Keyword lists for the approval classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub question_keywords: Vec<String>,
    pub action_keywords: Vec<String>,
    pub specific_phrases: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            question_keywords: ["do you want", "would you like", "would you"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            action_keywords: [
                "to proceed",
                "proceed",
                "to approve",
                "approve",
                "to create",
                "create",
                "to allow",
                "allow",
                "select",
                "choose",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            specific_phrases: [
                "select an option",
                "choose an option",
                "yes, and don't ask again",
                "yes, and remember",
                "yes, allow all edits",
                "approve this action",
                "allow this action",
                "grant permission",
                "proceed with",
                "continue with",
                "select one of the following",
                "choose one of the following",
                "no, and tell claude",
                "tell claude what to do differently",
                "tell it what to do differently",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Root configuration, built once at startup and shared by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub filters: WindowFilterConfig,
    pub ocr: OcrConfig,
    pub patterns: PatternConfig,
}

impl Config {
    /// Load configuration from a JSON file. A missing or malformed file
    /// falls back to defaults so the watcher can always come up.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring malformed config {}: {err}", path.display());
                Self::default()
            }),
            Err(err) => {
                log::warn!("could not read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write config to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.timing.scan_interval_secs, 10);
        assert_eq!(cfg.timing.cooldown_secs, 20);
        assert_eq!(cfg.filters.min_width, 100);
        assert_eq!(cfg.filters.min_height, 20);
        assert_eq!(cfg.ocr.min_scale_width, 1200);
        assert!(cfg
            .patterns
            .specific_phrases
            .iter()
            .any(|p| p == "yes, and don't ask again"));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"timing": {"scan_interval_secs": 3}}"#).unwrap();
        assert_eq!(cfg.timing.scan_interval_secs, 3);
        assert_eq!(cfg.timing.cooldown_secs, 20);
        assert_eq!(cfg.ocr.language, "eng");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let cfg = Config::load(Path::new("/nonexistent/autonod.json"));
        assert_eq!(cfg.timing.scan_interval_secs, 10);
    }
}
