//! URL Record - one normalized URL plus its (optional) page content
//!
//! Built once per inference request or corpus row, never mutated.

use url::Url;

use super::html::visible_text;
use crate::logic::error::{PipelineError, PipelineResult};

/// Trim surrounding whitespace and every trailing `/`
pub fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

// ============================================================================
// URL COMPONENTS
// ============================================================================

/// URL split into the components the lexical features read.
///
/// Path and query are raw slices of the input (no percent-encoding or dot
/// segment resolution). The hostname is the lowercased host as written
/// (Unicode labels stay Unicode). It is empty when the URL does not start
/// with a `scheme://` authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub hostname: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    pub fn parse(url: &str) -> Self {
        let (before_fragment, fragment) = url.split_once('#').unwrap_or((url, ""));
        let (base, query) = before_fragment.split_once('?').unwrap_or((before_fragment, ""));

        let (authority, path) = match after_scheme(base) {
            Some(rest) => match rest.find('/') {
                Some(i) => (Some(&rest[..i]), &rest[i..]),
                None => (Some(rest), ""),
            },
            None => (None, base),
        };

        Self {
            hostname: authority.map(host_from_authority).unwrap_or_default(),
            path: path.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        }
    }
}

/// Text after `scheme://`, only when the leading scheme is well formed
fn after_scheme(base: &str) -> Option<&str> {
    let (scheme, rest) = base.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        rest.strip_prefix("//")
    } else {
        None
    }
}

/// Hostname as the `url` crate sees it: lowercased, IDNA-encoded, no brackets
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches('[').trim_end_matches(']').to_lowercase())
}

/// Host part of an authority: userinfo, port and IPv6 brackets stripped
fn host_from_authority(authority: &str) -> String {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match host_port.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or(""),
        None => host_port.split(':').next().unwrap_or(""),
    };
    host.to_lowercase()
}

// ============================================================================
// URL RECORD
// ============================================================================

#[derive(Debug, Clone)]
pub struct UrlRecord {
    url: String,
    parts: UrlParts,
    content: Option<String>,
    visible_text: Option<String>,
}

impl UrlRecord {
    /// Normalize and validate a URL. Empty input is a client error.
    pub fn new(raw: &str) -> PipelineResult<Self> {
        let url = normalize_url(raw);
        if url.is_empty() {
            return Err(PipelineError::InvalidInput("Missing 'url' parameter".to_string()));
        }

        let parts = UrlParts::parse(&url);
        Ok(Self {
            url,
            parts,
            content: None,
            visible_text: None,
        })
    }

    /// Attach fetched markup. Empty markup means "no content".
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if content.is_empty() {
            self.content = None;
            self.visible_text = None;
        } else {
            self.visible_text = Some(visible_text(&content));
            self.content = Some(content);
        }
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parts(&self) -> &UrlParts {
        &self.parts
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn visible_text(&self) -> Option<&str> {
        self.visible_text.as_deref()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}
