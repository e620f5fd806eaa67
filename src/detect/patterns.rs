//! Individual approval-prompt detectors. Each one is stateless: `matches`
//! is a pure function of the text, so the composite classifier stays
//! deterministic across repeated calls on identical input.

/// Outcome of one detector against one text.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub confidence: f32,
    pub excerpt: String,
}

pub trait Pattern: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, text: &str) -> Option<PatternMatch>;
}

/// True when `line` contains `digit` followed by `.` or `)` and not preceded
/// by another digit, so "11." never counts as option 1.
pub fn line_has_marker(line: &str, digit: char) -> bool {
    let bytes = line.as_bytes();
    let d = digit as u8;
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == d && (bytes[i + 1] == b'.' || bytes[i + 1] == b')') {
            let preceded_by_digit = i > 0 && bytes[i - 1].is_ascii_digit();
            if !preceded_by_digit {
                return true;
            }
        }
    }
    false
}

/// Which numbered option markers a text carries. Value type so detection
/// results can hand the analyzer pre-scanned markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionScan {
    pub has_option_1: bool,
    pub has_option_2: bool,
    pub has_option_3: bool,
}

impl OptionScan {
    pub fn of(text: &str) -> Self {
        let mut scan = Self::default();
        for line in text.lines() {
            let line = line.trim().to_lowercase();
            scan.has_option_1 |= line_has_marker(&line, '1');
            scan.has_option_2 |= line_has_marker(&line, '2');
            scan.has_option_3 |= line_has_marker(&line, '3');
        }
        scan
    }

    /// The mandatory gate: an interactive choice shows at least the first
    /// two numbered options.
    pub fn gate_passed(&self) -> bool {
        self.has_option_1 || self.has_option_2
    }

    pub fn count(&self) -> usize {
        [self.has_option_1, self.has_option_2, self.has_option_3]
            .iter()
            .filter(|present| **present)
            .count()
    }
}

/// Detects the numbered option markers themselves.
pub struct OptionPattern;

impl Pattern for OptionPattern {
    fn name(&self) -> &'static str {
        "option"
    }

    fn matches(&self, text: &str) -> Option<PatternMatch> {
        let scan = OptionScan::of(text);
        if !scan.gate_passed() {
            return None;
        }

        let mut found = Vec::new();
        if scan.has_option_1 {
            found.push("1");
        }
        if scan.has_option_2 {
            found.push("2");
        }
        if scan.has_option_3 {
            found.push("3");
        }

        let confidence = if scan.has_option_1 && scan.has_option_2 {
            0.8
        } else {
            0.5
        };
        Some(PatternMatch {
            confidence,
            excerpt: format!("options {}", found.join(", ")),
        })
    }
}

/// Substring matcher over a lowercased, whitespace-normalized view of the
/// text, shared by the question/action/specific detectors.
pub struct KeywordPattern {
    name: &'static str,
    keywords: Vec<String>,
    confidence: f32,
}

impl KeywordPattern {
    pub fn new(name: &'static str, keywords: &[String], confidence: f32) -> Self {
        Self {
            name,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            confidence,
        }
    }

    /// Prompt-introducing phrasing ("do you want", ...).
    pub fn question(keywords: &[String]) -> Self {
        Self::new("question", keywords, 0.7)
    }

    /// Action-naming phrasing ("to proceed", "approve", ...).
    pub fn action(keywords: &[String]) -> Self {
        Self::new("action", keywords, 0.6)
    }

    /// Exact phrases unique to the observed tool's prompt style.
    pub fn specific(keywords: &[String]) -> Self {
        Self::new("specific", keywords, 0.9)
    }
}

impl Pattern for KeywordPattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, text: &str) -> Option<PatternMatch> {
        if text.is_empty() {
            return None;
        }
        let normalized = text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        self.keywords
            .iter()
            .find(|kw| normalized.contains(kw.as_str()))
            .map(|kw| PatternMatch {
                confidence: self.confidence,
                excerpt: kw.clone(),
            })
    }
}
