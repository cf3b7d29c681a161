//! Image fetching.
//!
//! [`ImageFetcher`] is the seam between the resolver and the network.
//! [`HttpFetcher`] is the blocking implementation; tests substitute an
//! in-memory double.

use std::io::Read;
use std::time::Duration;

/// Why an image could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),
}

/// Source of image bytes for a URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: ImageFetcher + ?Sized> ImageFetcher for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Per-request timeout. There are no retries.
    pub timeout: Duration,
    /// Responses larger than this are truncated and rejected.
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_bytes: 20 * 1024 * 1024,
            user_agent: concat!("figport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            max_bytes: config.max_bytes,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(e) => return Err(FetchError::Transport(e.to_string())),
        };

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(FetchError::Transport(format!(
                "response exceeds {} bytes",
                self.max_bytes
            )));
        }

        Ok(bytes)
    }
}
