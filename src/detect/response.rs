//! Decides which numbered option to answer with. Keyword scoring handles
//! reordered options across tool versions; when no option line parses, a
//! fixed rule keyed on the presence of a third option decides.

use super::patterns::{line_has_marker, OptionScan};

const DISQUALIFIED: i32 = -100;

/// Phrases that mark an option as a refusal or a free-text redirection
/// rather than an approval.
const DISQUALIFYING_PHRASES: [&str; 3] = [
    "tell it what to do differently",
    "tell claude",
    "type here",
];

#[derive(Debug, Clone, Default)]
pub struct ResponseAnalyzer;

impl ResponseAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Pick the key for the prompt in `text`. Always one of '1', '2', '3'.
    pub fn choose_key(&self, text: &str) -> char {
        let scan = OptionScan::of(text);

        let mut best: Option<(char, i32)> = None;
        for (digit, body) in extract_option_texts(text) {
            let score = score_option(&body);
            if score <= DISQUALIFIED {
                continue;
            }
            // Ties resolve to the lower-numbered option.
            let better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if better {
                best = Some((digit, score));
            }
        }

        match best {
            Some((digit, score)) if score > 0 => digit,
            // Nothing legible scored: three options means "yes, remember
            // this choice" sits at 2; two options means 1 is the one-time
            // approval.
            _ => fixed_rule(&scan),
        }
    }
}

fn fixed_rule(scan: &OptionScan) -> char {
    if scan.has_option_3 {
        '2'
    } else {
        '1'
    }
}

/// Pull the text following each option marker, lowercased. Only the first
/// occurrence per digit counts.
fn extract_option_texts(text: &str) -> Vec<(char, String)> {
    let mut out: Vec<(char, String)> = Vec::new();
    for line in text.lines() {
        let line = line.trim().to_lowercase();
        for digit in ['1', '2', '3'] {
            if out.iter().any(|(d, _)| *d == digit) {
                continue;
            }
            if !line_has_marker(&line, digit) {
                continue;
            }
            if let Some(body) = text_after_marker(&line, digit) {
                if !body.is_empty() {
                    out.push((digit, body));
                }
            }
        }
    }
    out
}

fn text_after_marker(line: &str, digit: char) -> Option<String> {
    for sep in ['.', ')'] {
        let marker = format!("{digit}{sep}");
        if let Some(pos) = line.find(&marker) {
            let preceded_by_digit = pos > 0
                && line.as_bytes()[pos - 1].is_ascii_digit();
            if preceded_by_digit {
                continue;
            }
            return Some(line[pos + marker.len()..].trim().to_string());
        }
    }
    None
}

/// Best-effort policy, not a verified mapping: positive keywords accumulate,
/// refusal shapes disqualify outright.
fn score_option(body: &str) -> i32 {
    let first_word = body
        .split([',', ' '])
        .find(|w| !w.is_empty())
        .unwrap_or("");
    if first_word == "no" {
        return DISQUALIFIED;
    }
    if DISQUALIFYING_PHRASES.iter().any(|p| body.contains(p)) {
        return DISQUALIFIED;
    }

    let mut score = 0;
    if body.contains("yes") {
        score += 10;
    }
    if body.contains("approve") {
        score += 10;
    }
    if body.contains("allow") {
        score += 8;
    }
    if body.contains("proceed") {
        score += 8;
    }
    if body.contains("don't ask again") || body.contains("dont ask again") {
        score += 5;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> char {
        ResponseAnalyzer::new().choose_key(text)
    }

    #[test]
    fn three_option_prompt_picks_persistent_yes() {
        let text = "Do you want to proceed?\n1. Yes\n2. Yes, and don't ask again\n3. No, and tell it what to do differently";
        assert_eq!(key(text), '2');
    }

    #[test]
    fn two_option_prompt_picks_one_time_yes() {
        let text = "Do you want to allow this?\n1. Yes, allow\n2. No, cancel";
        assert_eq!(key(text), '1');
    }

    #[test]
    fn reordered_options_follow_scores_not_position() {
        let text = "Choose:\n1. No, cancel\n2. Yes, approve this";
        assert_eq!(key(text), '2');
    }

    #[test]
    fn typed_input_option_is_disqualified() {
        let text = "Select an option\n1. Yes\n2. Type here to give instructions";
        assert_eq!(key(text), '1');
    }

    #[test]
    fn bare_markers_fall_back_to_fixed_rule() {
        assert_eq!(key("pick:\n1.\n2.\n3."), '2');
        assert_eq!(key("pick:\n1.\n2."), '1');
    }

    #[test]
    fn empty_text_defaults_to_one() {
        assert_eq!(key(""), '1');
    }

    #[test]
    fn all_disqualified_options_fall_back_to_fixed_rule() {
        let text = "1. No\n2. No, and tell it what to do differently\n3. No";
        assert_eq!(key(text), '2');
    }

    #[test]
    fn tie_prefers_lower_option() {
        let text = "1. Yes\n2. Yes";
        assert_eq!(key(text), '1');
    }

    #[test]
    fn eleven_marker_is_not_option_one() {
        // "11." must not parse as option 1; no legible options remain, and
        // no "3." marker exists, so the fixed rule yields '1'.
        assert_eq!(key("11. yes to all of it"), '1');
    }
}
