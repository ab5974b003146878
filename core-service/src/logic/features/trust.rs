//! Trust / Brand Heuristic
//!
//! Looks the URL's registrable domain up in the trusted domain set and scans
//! the URL for any trusted entry as a substring. The substring scan uses a
//! precomputed Aho–Corasick automaton instead of a loop over every entry.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use aho_corasick::AhoCorasick;

use super::layout::BrandScope;
use super::record::{host_of, UrlParts, UrlRecord};
use super::vector::{FeatureExtractor, FeatureSet};
use crate::logic::error::{PipelineError, PipelineResult};

/// Names written by [`TrustFeatures`]
pub const TRUST_FEATURES: &[&str] = &["is_known_brand", "brand_in_path", "brand_domain_mismatch"];

// ============================================================================
// TRUSTED DOMAIN SET
// ============================================================================

/// Lowercase trusted entries, read-only after load
#[derive(Debug, Clone)]
pub struct TrustedDomainSet {
    domains: HashSet<String>,
    matcher: AhoCorasick,
}

impl TrustedDomainSet {
    pub fn new<I, S>(entries: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains: HashSet<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let mut patterns: Vec<&str> = domains.iter().map(String::as_str).collect();
        patterns.sort_unstable();
        let matcher = AhoCorasick::new(&patterns)?;

        Ok(Self { domains, matcher })
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty::<&str>())
            .unwrap_or_else(|e| unreachable!("empty matcher failed to build: {e}"))
    }

    /// Load a newline-delimited list. Blank lines are skipped.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let set = Self::new(raw.lines())?;
        log::info!("Loaded {} trusted domains from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    /// True if any trusted entry occurs in `haystack` (already lowercased)
    pub fn appears_in(&self, haystack: &str) -> bool {
        !self.domains.is_empty() && self.matcher.is_match(haystack)
    }
}

// ============================================================================
// REGISTRABLE DOMAIN
// ============================================================================

/// Registrable domain (label + public suffix) of a URL, lowercased.
///
/// Only ICANN suffixes count: hosting platforms in the private section of
/// the public suffix list (`github.io`, `blogspot.com`) are registrable
/// domains themselves. The lookup runs on the IDNA form of the host, the
/// result keeps the labels as written. Scheme-less input is read as if it
/// started with `http://`.
pub fn registrable_domain(record: &UrlRecord) -> Option<String> {
    let host = if record.parts().hostname.is_empty() {
        UrlParts::parse(&format!("http://{}", record.url())).hostname
    } else {
        record.parts().hostname.clone()
    };
    if host.is_empty() {
        return None;
    }

    let ascii = host_of(&format!("http://{host}")).unwrap_or_else(|| host.clone());
    let domain = icann_domain(&ascii)?;

    let wanted = domain.split('.').count();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == ascii.split('.').count() && labels.len() >= wanted {
        Some(labels[labels.len() - wanted..].join("."))
    } else {
        Some(domain)
    }
}

/// Label + ICANN public suffix of an ASCII host
fn icann_domain(host: &str) -> Option<String> {
    let suffix = icann_suffix(host)?;
    let rest = host.strip_suffix(suffix)?.strip_suffix('.')?;
    let label = rest.rsplit('.').next().filter(|l| !l.is_empty())?;
    Some(format!("{label}.{suffix}"))
}

/// Longest matching suffix, skipping private-section rules
fn icann_suffix(host: &str) -> Option<&str> {
    let mut tail = host;
    loop {
        let suffix = psl::suffix(tail.as_bytes())?;
        let text = tail.get(tail.len().checked_sub(suffix.as_bytes().len())?..)?;
        if !matches!(suffix.typ(), Some(psl::Type::Private)) {
            return Some(text);
        }
        tail = text.split_once('.')?.1;
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrustFeatures {
    trusted: Arc<TrustedDomainSet>,
    scope: BrandScope,
}

impl TrustFeatures {
    pub fn new(trusted: Arc<TrustedDomainSet>, scope: BrandScope) -> Self {
        Self { trusted, scope }
    }

    /// Lowercased text the brand scan runs over
    fn scan_target(&self, record: &UrlRecord) -> String {
        match self.scope {
            BrandScope::FullUrl => record.url().to_lowercase(),
            BrandScope::PathOnly => {
                let parts = record.parts();
                format!("{}?{}#{}", parts.path, parts.query, parts.fragment).to_lowercase()
            }
        }
    }
}

impl FeatureExtractor for TrustFeatures {
    fn id(&self) -> &'static str {
        "trust"
    }

    fn feature_names(&self) -> Vec<String> {
        TRUST_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet) {
        let is_known = registrable_domain(record)
            .map(|domain| self.trusted.contains(&domain))
            .unwrap_or(false);
        let brand_in_path = self.trusted.appears_in(&self.scan_target(record));

        out.insert_flag("is_known_brand", is_known);
        out.insert_flag("brand_in_path", brand_in_path);
        out.insert_flag("brand_domain_mismatch", brand_in_path && !is_known);
    }
}

// ============================================================================
// TESTS
// ============================================================================
