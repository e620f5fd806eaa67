//! Human-readable action summaries. The scanner queues one item per
//! successful keystroke and flushes the queue at the end of each cycle;
//! display failure is never fatal.

use chrono::{DateTime, Utc};

const PREVIEW_LINES: usize = 8;
const PREVIEW_MAX_CHARS: usize = 400;

#[derive(Debug, Clone)]
pub struct NotificationItem {
    pub title: String,
    pub message: String,
    pub window_title: String,
    pub response_key: char,
    pub timestamp: DateTime<Utc>,
}

impl NotificationItem {
    /// Compose the summary for one answered prompt: window title plus a
    /// truncated excerpt of the recognized text.
    pub fn for_approval(window_title: &str, key: char, text: &str) -> Self {
        let short_title: String = window_title.chars().take(60).collect();
        let preview = text_preview(text);
        let message = if preview.is_empty() {
            format!("Window: {short_title}")
        } else {
            format!("Window: {short_title}\n{preview}")
        };
        Self {
            title: "Auto approval complete".to_string(),
            message,
            window_title: short_title,
            response_key: key,
            timestamp: Utc::now(),
        }
    }
}

fn text_preview(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if joined.chars().count() > PREVIEW_MAX_CHARS {
        let truncated: String = joined.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

/// Presentation seam. Toast, console, or log; the scanner does not care.
pub trait NotificationSink: Send + Sync {
    /// Returns false when display failed; callers treat that as advisory.
    fn show(&self, item: &NotificationItem) -> bool;
}

/// Default sink: renders through the log facade.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn show(&self, item: &NotificationItem) -> bool {
        log::info!(
            "{}: answered '{}' in \"{}\"",
            item.title,
            item.response_key,
            item.window_title
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_first_non_empty_lines() {
        let text = "\n  Do you want to proceed?  \n\n1. Yes\n2. No\n";
        let item = NotificationItem::for_approval("claude - ~/project", '1', text);
        assert!(item.message.contains("Do you want to proceed?"));
        assert!(item.message.contains("1. Yes"));
        assert_eq!(item.response_key, '1');
    }

    #[test]
    fn preview_truncates_long_text() {
        let long_line = "x".repeat(600);
        let item = NotificationItem::for_approval("w", '2', &long_line);
        assert!(item.message.ends_with("..."));
        assert!(item.message.chars().count() < 600);
    }

    #[test]
    fn long_window_titles_are_capped() {
        let title = "t".repeat(100);
        let item = NotificationItem::for_approval(&title, '1', "");
        assert_eq!(item.window_title.chars().count(), 60);
    }
}
