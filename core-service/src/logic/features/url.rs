//! Lexical URL Feature Extraction
//!
//! Pure functions over the normalized URL string. No I/O.
//! Every ratio is 0 for an empty input, never NaN.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::keywords::KeywordLists;
use super::record::UrlRecord;
use super::vector::{FeatureExtractor, FeatureSet};

/// Names written by [`UrlFeatures`]
pub const URL_FEATURES: &[&str] = &[
    "url_length",
    "entropy",
    "has_https",
    "NoHttps",
    "num_dots",
    "subdomain_level",
    "path_level",
    "num_dash",
    "at_symbol",
    "num_underscore",
    "num_numeric_chars",
    "url_shortener_used",
    "prefix_suffix_in_domain",
    "domain_is_ip",
    "hostname_length",
    "tld_length",
    "HttpsInHostname",
    "DoubleSlashInPath",
    "RandomString",
    "NumQueryComponents",
    "QueryLength",
    "NumAmpersand",
    "NumHash",
    "DomainInSubdomains",
    "DomainInPaths",
    "CharContinuationRate",
    "LetterRatioInURL",
    "DigitRatioInURL",
    "suspicious_keywords",
];

const URL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl", "t.co", "goo.gl"];

/// Brands checked by the subdomain/path impersonation flags
const IMPERSONATED_BRANDS: &[&str] = &["google", "paypal", "amazon"];

static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+").expect("valid dotted quad regex"));

static RANDOM_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]{3,}\d{3,}").expect("valid random string regex"));

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// Decimal digits in any script. Digit-like symbols outside `Nd`
/// (superscripts, fractions, roman numerals) are not counted.
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Nd}").expect("valid digit regex"));

/// Letters in any script. Combining marks and letter-like numerals are not letters.
static LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").expect("valid letter regex"));

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Shannon entropy (base 2) of the character distribution. 0 for "".
///
/// Terms are summed in first-occurrence order so the result is reproducible
/// to the bit.
pub fn shannon_entropy(s: &str) -> f64 {
    let mut order: Vec<char> = Vec::new();
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;

    for c in s.chars() {
        total += 1;
        let count = counts.entry(c).or_insert_with(|| {
            order.push(c);
            0
        });
        *count += 1;
    }

    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    let sum: f64 = order
        .iter()
        .map(|c| {
            let p = counts[c] as f64 / n;
            p * p.log2()
        })
        .sum();
    // -0.0 for single-symbol strings
    if sum == 0.0 { 0.0 } else { -sum }
}

/// Longest run of one repeated character, divided by the length
pub fn char_continuation_rate(s: &str) -> f64 {
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut previous: Option<char> = None;
    let mut total = 0usize;

    for c in s.chars() {
        total += 1;
        current = if previous == Some(c) { current + 1 } else { 1 };
        longest = longest.max(current);
        previous = Some(c);
    }

    ratio(longest, total)
}

/// `count / total`, 0 when `total` is 0
pub fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Lexical URL features
#[derive(Debug, Clone, Default)]
pub struct UrlFeatures {
    keywords: Arc<KeywordLists>,
}

impl UrlFeatures {
    pub fn new(keywords: Arc<KeywordLists>) -> Self {
        Self { keywords }
    }

    /// Compute every lexical feature of `record`
    pub fn analyze(&self, record: &UrlRecord) -> FeatureSet {
        let mut out = FeatureSet::new();
        self.extract(record, &mut out);
        out
    }
}

impl FeatureExtractor for UrlFeatures {
    fn id(&self) -> &'static str {
        "url"
    }

    fn feature_names(&self) -> Vec<String> {
        URL_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet) {
        let url = record.url();
        let parts = record.parts();
        let hostname = parts.hostname.as_str();
        let path = parts.path.as_str();
        let query = parts.query.as_str();

        let length = url.chars().count();
        let digits = DIGIT.find_iter(url).count();
        let letters = LETTER.find_iter(url).count();
        let https = url.starts_with("https");

        out.insert_count("url_length", length);
        out.insert("entropy", shannon_entropy(url) as f32);
        out.insert_flag("has_https", https);
        out.insert_flag("NoHttps", !https);
        out.insert_count("num_dots", url.matches('.').count());

        let subdomain_level = if hostname.is_empty() {
            0.0
        } else {
            hostname.matches('.').count() as f32 - 1.0
        };
        out.insert("subdomain_level", subdomain_level);

        out.insert_count("path_level", path.matches('/').count());
        out.insert_count("num_dash", url.matches('-').count());
        out.insert_flag("at_symbol", url.contains('@'));
        out.insert_count("num_underscore", url.matches('_').count());
        out.insert_count("num_numeric_chars", digits);
        out.insert_flag(
            "url_shortener_used",
            URL_SHORTENERS.iter().any(|s| url.contains(s)),
        );
        out.insert_flag("prefix_suffix_in_domain", hostname.contains('-'));
        out.insert_flag("domain_is_ip", DOTTED_QUAD.is_match(hostname));
        out.insert_count("hostname_length", hostname.chars().count());

        let tld_length = match hostname.rsplit_once('.') {
            Some((_, tld)) => tld.chars().count(),
            None => 0,
        };
        out.insert_count("tld_length", tld_length);

        out.insert_flag("HttpsInHostname", hostname.contains("https"));
        out.insert_flag("DoubleSlashInPath", path.trim_matches('/').contains("//"));
        out.insert_flag("RandomString", RANDOM_STRING.is_match(hostname));
        out.insert_count(
            "NumQueryComponents",
            query.matches('=').count() + query.matches('&').count(),
        );
        out.insert_count("QueryLength", query.chars().count());
        out.insert_count("NumAmpersand", url.matches('&').count());
        out.insert_count("NumHash", url.matches('#').count());

        let labels: Vec<&str> = hostname.split('.').collect();
        let subdomains = &labels[..labels.len().saturating_sub(2)];
        out.insert_flag(
            "DomainInSubdomains",
            subdomains.iter().any(|label| IMPERSONATED_BRANDS.contains(label)),
        );
        out.insert_flag(
            "DomainInPaths",
            IMPERSONATED_BRANDS.iter().any(|brand| path.contains(brand)),
        );

        out.insert("CharContinuationRate", char_continuation_rate(url) as f32);
        out.insert("LetterRatioInURL", ratio(letters, length) as f32);
        out.insert("DigitRatioInURL", ratio(digits, length) as f32);

        let lowered = url.to_lowercase();
        let suspicious = NON_WORD
            .split(&lowered)
            .filter(|token| self.keywords.is_suspicious_url_token(token))
            .count();
        out.insert_count("suspicious_keywords", suspicious);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(url: &str) -> FeatureSet {
        UrlFeatures::default().analyze(&UrlRecord::new(url).unwrap())
    }

    #[test]
    fn test_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 1e-12);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_continuation_rate() {
        assert_eq!(char_continuation_rate(""), 0.0);
        assert_eq!(char_continuation_rate("abc"), 1.0 / 3.0);
        assert_eq!(char_continuation_rate("aaab"), 0.75);
    }

    #[test]
    fn test_ratio_guards_empty() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 4), 0.75);
    }

    #[test]
    fn test_basic_counts() {
        let f = analyze("https://secure-login.example.com/a/b?x=1&y=2");
        assert_eq!(f.get("url_length"), Some(44.0));
        assert_eq!(f.get("has_https"), Some(1.0));
        assert_eq!(f.get("NoHttps"), Some(0.0));
        assert_eq!(f.get("num_dash"), Some(1.0));
        assert_eq!(f.get("path_level"), Some(2.0));
        assert_eq!(f.get("num_numeric_chars"), Some(2.0));
        assert_eq!(f.get("hostname_length"), Some(24.0));
        assert_eq!(f.get("prefix_suffix_in_domain"), Some(1.0));
        assert_eq!(f.get("subdomain_level"), Some(1.0));
        assert_eq!(f.get("tld_length"), Some(3.0));
        assert_eq!(f.get("NumQueryComponents"), Some(3.0));
        assert_eq!(f.get("QueryLength"), Some(7.0));
        assert_eq!(f.get("NumAmpersand"), Some(1.0));
    }

    #[test]
    fn test_letter_and_digit_classes() {
        // ½ and Ⅻ are neither digits nor letters, а and ٣ are
        let f = analyze("http://a.com/\u{bd}\u{216b}\u{430}\u{663}");
        assert_eq!(f.get("url_length"), Some(17.0));
        assert_eq!(f.get("num_numeric_chars"), Some(1.0));
        assert_eq!(f.get("DigitRatioInURL"), Some(ratio(1, 17) as f32));
        assert_eq!(f.get("LetterRatioInURL"), Some(ratio(9, 17) as f32));

        // Superscript two is digit-like but not a decimal digit
        let f = analyze("http://x\u{b2}.org");
        assert_eq!(f.get("num_numeric_chars"), Some(0.0));
    }

    #[test]
    fn test_every_name_is_written() {
        let f = analyze("http://x.org");
        for name in URL_FEATURES {
            assert!(f.contains(name), "missing {name}");
        }
        assert_eq!(f.len(), URL_FEATURES.len());
    }

    #[test]
    fn test_host_shape_flags() {
        let f = analyze("http://10.0.0.1/paypal//x/");
        assert_eq!(f.get("domain_is_ip"), Some(1.0));
        assert_eq!(f.get("DomainInPaths"), Some(1.0));
        assert_eq!(f.get("DoubleSlashInPath"), Some(1.0));

        let f = analyze("http://paypal.evil.com");
        assert_eq!(f.get("DomainInSubdomains"), Some(1.0));

        let f = analyze("http://abc123.com");
        assert_eq!(f.get("RandomString"), Some(1.0));

        let f = analyze("http://bit.ly/xyz");
        assert_eq!(f.get("url_shortener_used"), Some(1.0));
    }

    #[test]
    fn test_scheme_less_url_has_no_hostname() {
        let f = analyze("example.com/login");
        assert_eq!(f.get("hostname_length"), Some(0.0));
        assert_eq!(f.get("subdomain_level"), Some(0.0));
        assert_eq!(f.get("path_level"), Some(1.0));
    }

    #[test]
    fn test_suspicious_keywords() {
        let keywords = KeywordLists {
            suspicious_url_tokens: ["login", "verify"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let extractor = UrlFeatures::new(Arc::new(keywords));
        let f = extractor.analyze(&UrlRecord::new("http://Verify-Account.com/login").unwrap());
        assert_eq!(f.get("suspicious_keywords"), Some(2.0));
    }

    #[test]
    fn test_ratios_bounded() {
        for url in ["a", "1", "https://x.y/z", "http://1234567890", "----", "ü.com"] {
            let f = analyze(url);
            for name in ["LetterRatioInURL", "DigitRatioInURL", "CharContinuationRate"] {
                let v = f.get(name).unwrap();
                assert!((0.0..=1.0).contains(&v), "{name}={v} for {url}");
            }
            assert!(f.get("entropy").unwrap() >= 0.0);
        }
    }
}
