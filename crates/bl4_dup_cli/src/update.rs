//! Published-version lookup for `update-check`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_UPDATE_URL: &str =
    "https://api.github.com/repos/Judgy53/BL4_Save_Duplicator/contents/version.txt";
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("version document is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("version document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("version document is empty")]
    Empty,
}

pub trait VersionSource {
    fn fetch_latest(&self) -> Result<String, UpdateError>;
}

/// Reads a version string from a GitHub contents API document.
pub struct GithubContentSource {
    url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ContentsDocument {
    content: String,
}

impl GithubContentSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }
}

impl VersionSource for GithubContentSource {
    fn fetch_latest(&self) -> Result<String, UpdateError> {
        debug!(url = %self.url, "fetching latest version");
        let document: ContentsDocument = self
            .client
            .get(&self.url)
            .header(USER_AGENT, concat!("bl4-dup/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json()?;
        decode_content(&document.content)
    }
}

/// GitHub wraps base64 content at 60 columns.
pub fn decode_content(content: &str) -> Result<String, UpdateError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let text = String::from_utf8(STANDARD.decode(compact)?)?;
    let version = text.trim();
    if version.is_empty() {
        return Err(UpdateError::Empty);
    }
    Ok(version.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatus {
    pub current: String,
    pub latest: String,
}

impl UpdateStatus {
    pub fn update_available(&self) -> bool {
        self.current != self.latest
    }
}

/// Caller-owned latest-version cache. The source is queried at most once
/// until [`VersionCache::reset`]; failed lookups are not cached.
pub struct VersionCache<S> {
    source: S,
    latest: Option<String>,
}

impl<S: VersionSource> VersionCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            latest: None,
        }
    }

    pub fn latest(&mut self) -> Result<&str, UpdateError> {
        let latest = match self.latest.take() {
            Some(version) => version,
            None => self.source.fetch_latest()?,
        };
        Ok(self.latest.insert(latest).as_str())
    }

    pub fn check(&mut self, current: &str) -> Result<UpdateStatus, UpdateError> {
        let latest = self.latest()?.to_string();
        Ok(UpdateStatus {
            current: current.to_string(),
            latest,
        })
    }

    pub fn reset(&mut self) {
        self.latest = None;
    }
}
