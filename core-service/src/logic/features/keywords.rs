//! Keyword Lists
//!
//! Four read-only term lists used by the URL and text extractors:
//!
//! | File                          | Used by                 |
//! |-------------------------------|-------------------------|
//! | `suspicious_url_keywords.txt` | `suspicious_keywords`   |
//! | `suspicious_text_terms.txt`   | `suspicious_text_terms` |
//! | `sensitive_terms.txt`         | `NumSensitiveWords`     |
//! | `known_brands.txt`            | `EmbeddedBrandName`     |
//!
//! A missing file loads as an empty list.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::tfidf::{is_stop_word, tokenize};
use crate::logic::error::{PipelineError, PipelineResult};

pub const SUSPICIOUS_URL_FILE: &str = "suspicious_url_keywords.txt";
pub const SUSPICIOUS_TEXT_FILE: &str = "suspicious_text_terms.txt";
pub const SENSITIVE_TERMS_FILE: &str = "sensitive_terms.txt";
pub const KNOWN_BRANDS_FILE: &str = "known_brands.txt";

/// How many terms `fit` keeps per list
pub const DEFAULT_KEYWORD_LIMIT: usize = 100;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordLists {
    pub suspicious_url_tokens: HashSet<String>,
    pub suspicious_text_terms: HashSet<String>,
    pub sensitive_terms: HashSet<String>,
    pub known_brands: HashSet<String>,
}

impl KeywordLists {
    pub fn load(dir: &Path) -> PipelineResult<Self> {
        let lists = Self {
            suspicious_url_tokens: read_list(&dir.join(SUSPICIOUS_URL_FILE))?,
            suspicious_text_terms: read_list(&dir.join(SUSPICIOUS_TEXT_FILE))?,
            sensitive_terms: read_list(&dir.join(SENSITIVE_TERMS_FILE))?,
            known_brands: read_list(&dir.join(KNOWN_BRANDS_FILE))?,
        };
        log::info!(
            "Loaded keyword lists from {} (url: {}, text: {}, sensitive: {}, brands: {})",
            dir.display(),
            lists.suspicious_url_tokens.len(),
            lists.suspicious_text_terms.len(),
            lists.sensitive_terms.len(),
            lists.known_brands.len()
        );
        Ok(lists)
    }

    /// Write the generated lists. Sensitive terms and brands are curated
    /// by hand and only written when non-empty.
    pub fn save(&self, dir: &Path) -> PipelineResult<()> {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        write_list(&dir.join(SUSPICIOUS_URL_FILE), &self.suspicious_url_tokens)?;
        write_list(&dir.join(SUSPICIOUS_TEXT_FILE), &self.suspicious_text_terms)?;
        if !self.sensitive_terms.is_empty() {
            write_list(&dir.join(SENSITIVE_TERMS_FILE), &self.sensitive_terms)?;
        }
        if !self.known_brands.is_empty() {
            write_list(&dir.join(KNOWN_BRANDS_FILE), &self.known_brands)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.suspicious_url_tokens.is_empty()
            && self.suspicious_text_terms.is_empty()
            && self.sensitive_terms.is_empty()
            && self.known_brands.is_empty()
    }

    /// SHA-256 over every list's sorted terms, hex encoded. Empty lists
    /// hash too, so a missing keywords directory is still detectable.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, list) in [
            (SUSPICIOUS_URL_FILE, &self.suspicious_url_tokens),
            (SUSPICIOUS_TEXT_FILE, &self.suspicious_text_terms),
            (SENSITIVE_TERMS_FILE, &self.sensitive_terms),
            (KNOWN_BRANDS_FILE, &self.known_brands),
        ] {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            let mut terms: Vec<&String> = list.iter().collect();
            terms.sort();
            for term in terms {
                hasher.update(term.as_bytes());
                hasher.update([b'\n']);
            }
        }
        hex::encode(hasher.finalize())
    }

    pub fn is_suspicious_url_token(&self, token: &str) -> bool {
        self.suspicious_url_tokens.contains(token)
    }

    pub fn is_suspicious_text_term(&self, word: &str) -> bool {
        self.suspicious_text_terms.contains(word)
    }

    /// Number of sensitive terms occurring anywhere in `lowered`
    pub fn count_sensitive(&self, lowered: &str) -> usize {
        self.sensitive_terms.iter().filter(|t| lowered.contains(t.as_str())).count()
    }

    pub fn mentions_brand(&self, lowered: &str) -> bool {
        self.known_brands.iter().any(|b| lowered.contains(b.as_str()))
    }

    /// Derive the suspicious lists from phishing samples.
    ///
    /// `urls` and `texts` come from phishing rows only. Keeps the `limit`
    /// most frequent URL tokens and non-stop-word text terms.
    pub fn fit<'a>(
        urls: impl IntoIterator<Item = &'a str>,
        texts: impl IntoIterator<Item = &'a str>,
        limit: usize,
    ) -> Self {
        let mut url_counts: HashMap<String, usize> = HashMap::new();
        for url in urls {
            let lowered = url.to_lowercase();
            for token in WORD.find_iter(&lowered) {
                *url_counts.entry(token.as_str().to_string()).or_default() += 1;
            }
        }

        let mut text_counts: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for term in tokenize(text).into_iter().filter(|t| !is_stop_word(t)) {
                *text_counts.entry(term).or_default() += 1;
            }
        }

        Self {
            suspicious_url_tokens: top_terms(url_counts, limit),
            suspicious_text_terms: top_terms(text_counts, limit),
            ..Default::default()
        }
    }
}

/// Most frequent terms first, ties broken alphabetically
fn top_terms(counts: HashMap<String, usize>, limit: usize) -> HashSet<String> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(term, _)| term).collect()
}

fn read_list(path: &Path) -> PipelineResult<HashSet<String>> {
    if !path.exists() {
        log::warn!("Keyword list {} not found, using empty list", path.display());
        return Ok(HashSet::new());
    }
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(raw
        .lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect())
}

fn write_list(path: &Path, terms: &HashSet<String>) -> PipelineResult<()> {
    let mut sorted: Vec<&str> = terms.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut body = sorted.join("\n");
    body.push('\n');
    fs::write(path, body).map_err(|e| PipelineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_ranks_by_frequency() {
        let urls = ["http://login.verify.com/login", "http://login.x.ru"];
        let texts = ["Verify your account now", "verify the account"];
        let lists = KeywordLists::fit(urls, texts, 2);

        assert_eq!(
            lists.suspicious_url_tokens,
            ["http", "login"].iter().map(|s| s.to_string()).collect()
        );
        // "your", "now", "the" are stop words
        assert_eq!(
            lists.suspicious_text_terms,
            ["account", "verify"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_checksum_tracks_contents() {
        let mut lists = KeywordLists::fit(["http://login.x.ru"], ["verify account"], 10);
        let copy = lists.clone();
        assert_eq!(lists.checksum(), copy.checksum());
        assert_ne!(lists.checksum(), KeywordLists::default().checksum());

        // Same term in a different list is a different set of lists
        let mut moved = KeywordLists::default();
        moved.known_brands.insert("paypal".into());
        let mut sensitive = KeywordLists::default();
        sensitive.sensitive_terms.insert("paypal".into());
        assert_ne!(moved.checksum(), sensitive.checksum());

        let before = lists.checksum();
        lists.sensitive_terms.insert("ssn".into());
        assert_ne!(before, lists.checksum());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut lists = KeywordLists::fit(["http://secure-update.com"], ["update password"], 10);
        lists.known_brands.insert("paypal".into());
        lists.save(dir.path()).unwrap();

        let loaded = KeywordLists::load(dir.path()).unwrap();
        assert_eq!(loaded, lists);
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lists = KeywordLists::load(dir.path()).unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn test_substring_lookups() {
        let lists = KeywordLists {
            sensitive_terms: ["password", "ssn"].iter().map(|s| s.to_string()).collect(),
            known_brands: ["paypal".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(lists.count_sensitive("enter your password and ssn"), 2);
        assert!(lists.mentions_brand("log in to paypal"));
        assert!(!lists.mentions_brand("log in"));
    }
}
