pub mod patterns;
pub mod response;

use crate::config::PatternConfig;

use patterns::{KeywordPattern, OptionPattern, OptionScan, Pattern};
use response::ResponseAnalyzer;

/// Verdict for one extracted text. Produced once per text, immutable.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub is_approval: bool,
    pub matched_pattern: Option<String>,
    pub matched_excerpt: Option<String>,
    pub confidence: f32,
    pub recommended_key: char,
    pub options: OptionScan,
}

impl DetectionResult {
    fn rejection(options: OptionScan) -> Self {
        Self {
            is_approval: false,
            matched_pattern: None,
            matched_excerpt: None,
            confidence: 0.0,
            recommended_key: '1',
            options,
        }
    }
}

/// Two-tier approval classifier. The option gate is mandatory; at least one
/// registered keyword detector must also fire. Neither option markers alone
/// (a man page) nor question phrasing alone (marketing copy) suffices.
pub struct CompositeDetector {
    option_pattern: OptionPattern,
    patterns: Vec<Box<dyn Pattern>>,
    analyzer: ResponseAnalyzer,
}

impl CompositeDetector {
    pub fn new(config: &PatternConfig) -> Self {
        let patterns: Vec<Box<dyn Pattern>> = vec![
            Box::new(KeywordPattern::specific(&config.specific_phrases)),
            Box::new(KeywordPattern::question(&config.question_keywords)),
            Box::new(KeywordPattern::action(&config.action_keywords)),
        ];
        Self {
            option_pattern: OptionPattern,
            patterns,
            analyzer: ResponseAnalyzer::new(),
        }
    }

    /// Extension point: new detectors join the second tier without touching
    /// the combination logic.
    pub fn register(&mut self, pattern: Box<dyn Pattern>) {
        if self.patterns.iter().any(|p| p.name() == pattern.name()) {
            return;
        }
        self.patterns.push(pattern);
    }

    /// Pure function of `text`: identical input always yields the identical
    /// verdict and key.
    pub fn classify(&self, text: &str) -> DetectionResult {
        if text.is_empty() {
            return DetectionResult::rejection(OptionScan::default());
        }

        let options = OptionScan::of(text);
        if self.option_pattern.matches(text).is_none() {
            return DetectionResult::rejection(options);
        }

        let best = self
            .patterns
            .iter()
            .filter_map(|pattern| {
                pattern
                    .matches(text)
                    .map(|hit| (pattern.name(), hit))
            })
            .max_by(|(_, a), (_, b)| a.confidence.total_cmp(&b.confidence));

        let Some((name, hit)) = best else {
            return DetectionResult::rejection(options);
        };

        DetectionResult {
            is_approval: true,
            matched_pattern: Some(name.to_string()),
            matched_excerpt: Some(hit.excerpt),
            confidence: hit.confidence,
            recommended_key: self.analyzer.choose_key(text),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CompositeDetector {
        CompositeDetector::new(&PatternConfig::default())
    }

    #[test]
    fn three_option_claude_prompt_is_approved_with_key_two() {
        let text = "Do you want to proceed?\n1. Yes\n2. Yes, and don't ask again\n3. No, and tell it what to do differently";
        let result = detector().classify(text);
        assert!(result.is_approval);
        assert_eq!(result.recommended_key, '2');
        assert_eq!(result.matched_pattern.as_deref(), Some("specific"));
        assert!(result.options.has_option_3);
    }

    #[test]
    fn two_option_prompt_is_approved_with_key_one() {
        let text = "Do you want to allow this?\n1. Yes, allow\n2. No, cancel";
        let result = detector().classify(text);
        assert!(result.is_approval);
        assert_eq!(result.recommended_key, '1');
    }

    #[test]
    fn prose_mentioning_options_is_rejected() {
        let text = "README.md\nThis document explains option 1 and option 2 configuration.";
        let result = detector().classify(text);
        assert!(!result.is_approval);
    }

    #[test]
    fn markers_without_prompt_phrasing_are_rejected() {
        // Man-page shape: numbered list but no question or action phrasing.
        let text = "SYNOPSIS\n1. first form\n2. second form";
        assert!(!detector().classify(text).is_approval);
    }

    #[test]
    fn phrasing_without_markers_is_rejected() {
        let text = "Would you like to learn more? Visit our site to proceed.";
        assert!(!detector().classify(text).is_approval);
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(!detector().classify("").is_approval);
    }

    #[test]
    fn classify_is_deterministic() {
        let d = detector();
        let text = "Do you want to proceed?\n1. Yes\n2. No";
        let a = d.classify(text);
        let b = d.classify(text);
        assert_eq!(a.is_approval, b.is_approval);
        assert_eq!(a.recommended_key, b.recommended_key);
        assert_eq!(a.matched_pattern, b.matched_pattern);
    }

    #[test]
    fn specific_phrase_wins_the_confidence_ranking() {
        let text = "Select one of the following to proceed\n1. Yes\n2. No";
        let result = detector().classify(text);
        assert!(result.is_approval);
        assert_eq!(result.matched_pattern.as_deref(), Some("specific"));
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn registered_patterns_extend_the_second_tier() {
        struct ExclamationPattern;
        impl patterns::Pattern for ExclamationPattern {
            fn name(&self) -> &'static str {
                "exclamation"
            }
            fn matches(&self, text: &str) -> Option<patterns::PatternMatch> {
                text.contains('!').then(|| patterns::PatternMatch {
                    confidence: 0.95,
                    excerpt: "!".to_string(),
                })
            }
        }

        let mut d = detector();
        d.register(Box::new(ExclamationPattern));
        let result = d.classify("Confirm!\n1. Yes\n2. No");
        assert!(result.is_approval);
        assert_eq!(result.matched_pattern.as_deref(), Some("exclamation"));
    }
}
