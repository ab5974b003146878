//! Content Fetcher
//!
//! The only networked step of the pipeline. A fetch never fails: timeouts,
//! DNS/TLS errors and non-2xx responses all come back as empty content,
//! which the assembler treats as "no content".

use std::io::Read;
use std::time::Duration;

use crate::constants;

pub trait ContentFetcher: Send + Sync {
    /// Page markup, or an empty string on any failure
    fn fetch(&self, url: &str) -> String;
}

// ============================================================================
// HTTP
// ============================================================================

/// Blocking HTTP fetcher with a bounded timeout and body size
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(constants::FETCH_USER_AGENT)
            .build();
        Self { agent, max_bytes }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(constants::DEFAULT_FETCH_TIMEOUT_SECS),
            constants::DEFAULT_MAX_CONTENT_BYTES,
        )
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> String {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                log::warn!("Fetch {} returned HTTP {}, using empty content", url, code);
                return String::new();
            }
            Err(e) => {
                log::warn!("Fetch {} failed: {}, using empty content", url, e);
                return String::new();
            }
        };

        let mut body = Vec::new();
        if let Err(e) = response.into_reader().take(self.max_bytes).read_to_end(&mut body) {
            log::warn!("Reading body of {} failed: {}, using empty content", url, e);
            return String::new();
        }

        log::debug!("Fetched {} ({} bytes)", url, body.len());
        String::from_utf8_lossy(&body).into_owned()
    }
}

// ============================================================================
// OFFLINE
// ============================================================================

/// Never touches the network: every URL is scored from lexical features
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl ContentFetcher for OfflineFetcher {
    fn fetch(&self, _url: &str) -> String {
        String::new()
    }
}

/// Canned pages keyed by URL, for tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticFetcher {
    pub pages: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn with_page(url: &str, markup: &str) -> Self {
        let mut pages = std::collections::HashMap::new();
        pages.insert(url.to_string(), markup.to_string());
        Self { pages }
    }
}

#[cfg(test)]
impl ContentFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> String {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}
