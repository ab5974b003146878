//! Lexical Projection - TF-IDF over a frozen vocabulary
//!
//! Weights match scikit-learn's `TfidfVectorizer` defaults:
//! lowercase, tokens `\b\w\w+\b`, raw counts × smoothed IDF
//! `ln((1 + n) / (1 + df)) + 1`, L2 normalized per document.
//!
//! The vocabulary is fitted once offline. At inference time it is read-only:
//! unknown terms are ignored, nothing is ever added.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::layout::TfidfMode;
use super::record::UrlRecord;
use super::vector::{FeatureExtractor, FeatureSet};
use crate::logic::error::{read_json, write_json, PipelineError, PipelineResult};

/// Column prefix of projection features
pub const TFIDF_PREFIX: &str = "tfidf_";

/// Terms kept by `fit` unless told otherwise
pub const DEFAULT_MAX_FEATURES: usize = 300;

/// Version written into newly fitted vocabularies
pub const VOCABULARY_FORMAT: &str = "tfidf-v1";

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Lowercased tokens of two or more word characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

// ============================================================================
// VOCABULARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub term: String,
    pub idf: f64,
}

/// Fitted terms in alphabetical order with their IDF weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalVocabulary {
    pub version: String,
    pub fitted_at: chrono::DateTime<chrono::Utc>,
    pub document_count: usize,
    pub terms: Vec<VocabularyTerm>,
    pub checksum: String,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LexicalVocabulary {
    pub fn new(version: impl Into<String>, document_count: usize, mut terms: Vec<VocabularyTerm>) -> Self {
        terms.sort_by(|a, b| a.term.cmp(&b.term));
        let checksum = compute_checksum(&terms);
        let mut vocabulary = Self {
            version: version.into(),
            fitted_at: chrono::Utc::now(),
            document_count,
            terms,
            checksum,
            index: HashMap::new(),
        };
        vocabulary.build_index();
        vocabulary
    }

    /// Vocabulary with no terms: every projection is empty
    pub fn empty() -> Self {
        Self::new(VOCABULARY_FORMAT, 0, Vec::new())
    }

    fn build_index(&mut self) {
        self.index = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.term.clone(), i))
            .collect();
    }

    /// Load and verify a vocabulary artifact
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let mut vocabulary: Self = read_json(path)?;
        vocabulary.verify()?;
        vocabulary.build_index();
        log::info!(
            "Loaded vocabulary {} ({} terms, checksum {}) from {}",
            vocabulary.version,
            vocabulary.len(),
            &vocabulary.checksum[..12.min(vocabulary.checksum.len())],
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        write_json(path, self)
    }

    /// Recompute the checksum and check term order
    pub fn verify(&self) -> PipelineResult<()> {
        if self.terms.windows(2).any(|w| w[0].term >= w[1].term) {
            return Err(PipelineError::Vocabulary(
                "terms are not strictly sorted".to_string(),
            ));
        }
        if self.terms.iter().any(|t| !t.idf.is_finite()) {
            return Err(PipelineError::Vocabulary("non-finite idf weight".to_string()));
        }
        let actual = compute_checksum(&self.terms);
        if actual != self.checksum {
            return Err(PipelineError::Vocabulary(format!(
                "checksum mismatch: recorded {}, computed {}",
                self.checksum, actual
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn column_names(&self) -> Vec<String> {
        self.terms.iter().map(|t| column_name(&t.term)).collect()
    }

    /// L2-normalized TF-IDF weight per vocabulary term, in vocabulary order
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut weights = vec![0.0f64; self.terms.len()];
        if self.terms.is_empty() || text.is_empty() {
            return weights;
        }

        for token in tokenize(text) {
            if let Some(&i) = self.index.get(&token) {
                weights[i] += 1.0;
            }
        }

        for (w, term) in weights.iter_mut().zip(&self.terms) {
            *w *= term.idf;
        }

        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in weights.iter_mut() {
                *w /= norm;
            }
        }
        weights
    }

    /// Fit over a corpus of documents (offline only).
    ///
    /// Stop words are dropped, the `max_features` terms with the highest
    /// corpus frequency are kept (ties go to the alphabetically first term).
    pub fn fit<'a>(documents: impl IntoIterator<Item = &'a str>, max_features: usize) -> Self {
        let mut term_freq: BTreeMap<String, usize> = BTreeMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut n_docs = 0usize;

        for doc in documents {
            n_docs += 1;
            let mut seen: HashSet<String> = HashSet::new();
            for token in tokenize(doc).into_iter().filter(|t| !is_stop_word(t)) {
                *term_freq.entry(token.clone()).or_default() += 1;
                seen.insert(token);
            }
            for term in seen {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        // BTreeMap iteration is alphabetical, the stable sort keeps that for ties
        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(max_features);

        let n = n_docs as f64;
        let terms = ranked
            .into_iter()
            .map(|(term, _)| {
                let df = doc_freq.get(&term).copied().unwrap_or(0) as f64;
                let idf = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
                VocabularyTerm { term, idf }
            })
            .collect();

        let vocabulary = Self::new(VOCABULARY_FORMAT, n_docs, terms);
        log::info!("Fitted vocabulary: {} terms over {} documents", vocabulary.len(), n_docs);
        vocabulary
    }
}

pub fn column_name(term: &str) -> String {
    format!("{TFIDF_PREFIX}{term}")
}

/// SHA-256 over terms and weights, hex encoded
fn compute_checksum(terms: &[VocabularyTerm]) -> String {
    let mut hasher = Sha256::new();
    for t in terms {
        hasher.update(t.term.as_bytes());
        hasher.update([0u8]);
        hasher.update(t.idf.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

// ============================================================================
// EXTRACTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct TfidfFeatures {
    vocabulary: Arc<LexicalVocabulary>,
    mode: TfidfMode,
}

impl TfidfFeatures {
    pub fn new(vocabulary: Arc<LexicalVocabulary>, mode: TfidfMode) -> Self {
        Self { vocabulary, mode }
    }
}

impl FeatureExtractor for TfidfFeatures {
    fn id(&self) -> &'static str {
        "tfidf"
    }

    fn feature_names(&self) -> Vec<String> {
        self.vocabulary.column_names()
    }

    fn requires_content(&self) -> bool {
        true
    }

    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet) {
        let weights = self.vocabulary.transform(record.visible_text().unwrap_or(""));
        for (term, weight) in self.vocabulary.terms.iter().zip(weights) {
            let value = match self.mode {
                TfidfMode::Weighted => weight as f32,
                TfidfMode::Binary => {
                    if weight > 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
            out.insert(column_name(&term.term), value);
        }
    }
}

/// scikit-learn's English stop word list
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot",
    "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do", "done",
    "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else", "elsewhere",
    "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything", "everywhere",
    "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five", "for", "former",
    "formerly", "forty", "found", "four", "from", "front", "full", "further", "get", "give", "go",
    "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie",
    "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last",
    "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
    "might", "mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my",
    "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put", "rather", "re",
    "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several", "she", "should",
    "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten",
    "than", "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third",
    "this", "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together",
    "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> LexicalVocabulary {
        LexicalVocabulary::fit(
            ["login to your bank account", "bank news today", "latest news and events"],
            10,
        )
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Sign-In to PayPal, a 2FA!"), vec!["sign", "in", "to", "paypal", "2fa"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_fit_orders_and_weights() {
        let v = vocab();
        let terms: Vec<&str> = v.terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["account", "bank", "events", "latest", "login", "news", "today"]);

        // df("bank") = 2 of 3 docs
        let bank = &v.terms[1];
        assert!((bank.idf - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!(v.verify().is_ok());
    }

    #[test]
    fn test_fit_limits_by_frequency() {
        let v = LexicalVocabulary::fit(["zeta zeta alpha beta", "zeta beta"], 2);
        let terms: Vec<&str> = v.terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["beta", "zeta"]);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let v = vocab();
        let w = v.transform("Bank bank NEWS unknownterm");
        let norm: f64 = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert_eq!(w[0], 0.0);
        assert!(w[1] > w[5]);
    }

    #[test]
    fn test_unknown_or_empty_text_is_zero() {
        let v = vocab();
        assert!(v.transform("").iter().all(|w| *w == 0.0));
        assert!(v.transform("completely different words").iter().all(|w| *w == 0.0));
        assert_eq!(v.len(), 7);
    }

    #[test]
    fn test_round_trip_and_tamper_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        let v = vocab();
        v.save(&path).unwrap();

        let loaded = LexicalVocabulary::load(&path).unwrap();
        assert_eq!(loaded.checksum(), v.checksum());
        assert_eq!(loaded.transform("bank news"), v.transform("bank news"));

        let mut tampered = v.clone();
        tampered.terms[0].idf += 0.5;
        tampered.save(&path).unwrap();
        assert!(matches!(LexicalVocabulary::load(&path), Err(PipelineError::Vocabulary(_))));
    }

    #[test]
    fn test_extractor_modes() {
        let v = Arc::new(vocab());
        let record = UrlRecord::new("https://a.com").unwrap().with_content("<p>bank news</p>");

        let mut weighted = FeatureSet::new();
        TfidfFeatures::new(v.clone(), TfidfMode::Weighted).extract(&record, &mut weighted);
        assert!(weighted.get("tfidf_bank").unwrap() > 0.0);
        assert!(weighted.get("tfidf_bank").unwrap() < 1.0);
        assert_eq!(weighted.get("tfidf_login"), Some(0.0));

        let mut binary = FeatureSet::new();
        TfidfFeatures::new(v, TfidfMode::Binary).extract(&record, &mut binary);
        assert_eq!(binary.get("tfidf_bank"), Some(1.0));
        assert_eq!(binary.get("tfidf_news"), Some(1.0));
        assert_eq!(binary.get("tfidf_today"), Some(0.0));
        assert_eq!(binary.len(), 7);
    }
}
