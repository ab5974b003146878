//! Textual Content Features
//!
//! Counts over the page's visible text. Empty text gives zeros.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::keywords::KeywordLists;
use super::record::UrlRecord;
use super::vector::{FeatureExtractor, FeatureSet};

/// Names written by [`TextFeatures`]
pub const TEXT_FEATURES: &[&str] = &[
    "text_length",
    "num_text_words",
    "suspicious_text_terms",
    "NumSensitiveWords",
    "EmbeddedBrandName",
];

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

#[derive(Debug, Clone, Default)]
pub struct TextFeatures {
    keywords: Arc<KeywordLists>,
}

impl TextFeatures {
    pub fn new(keywords: Arc<KeywordLists>) -> Self {
        Self { keywords }
    }

    pub fn analyze(&self, text: &str, out: &mut FeatureSet) {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = WORD.find_iter(&lowered).map(|m| m.as_str()).collect();

        out.insert_count("text_length", lowered.chars().count());
        out.insert_count("num_text_words", words.len());
        out.insert_count(
            "suspicious_text_terms",
            words.iter().filter(|w| self.keywords.is_suspicious_text_term(w)).count(),
        );
        out.insert_count("NumSensitiveWords", self.keywords.count_sensitive(&lowered));
        out.insert_flag("EmbeddedBrandName", self.keywords.mentions_brand(&lowered));
    }
}

impl FeatureExtractor for TextFeatures {
    fn id(&self) -> &'static str {
        "text"
    }

    fn feature_names(&self) -> Vec<String> {
        TEXT_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    fn requires_content(&self) -> bool {
        true
    }

    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet) {
        self.analyze(record.visible_text().unwrap_or(""), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(extractor: &TextFeatures, text: &str) -> FeatureSet {
        let mut out = FeatureSet::new();
        extractor.analyze(text, &mut out);
        out
    }

    #[test]
    fn test_empty_text_is_zero() {
        let f = run(&TextFeatures::default(), "");
        assert_eq!(f.len(), TEXT_FEATURES.len());
        assert!(f.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_counts() {
        let f = run(&TextFeatures::default(), "Hello, world_1 it's 2024");
        assert_eq!(f.get("text_length"), Some(24.0));
        // hello, world_1, it, s, 2024
        assert_eq!(f.get("num_text_words"), Some(5.0));
    }

    #[test]
    fn test_keyword_features() {
        let keywords = KeywordLists {
            suspicious_text_terms: ["verify".to_string(), "urgent".to_string()].into(),
            sensitive_terms: ["password".to_string(), "credit card".to_string()].into(),
            known_brands: ["paypal".to_string()].into(),
            ..Default::default()
        };
        let f = run(
            &TextFeatures::new(Arc::new(keywords)),
            "URGENT: verify your PayPal password now, verify!",
        );
        assert_eq!(f.get("suspicious_text_terms"), Some(3.0));
        assert_eq!(f.get("NumSensitiveWords"), Some(1.0));
        assert_eq!(f.get("EmbeddedBrandName"), Some(1.0));
    }
}
