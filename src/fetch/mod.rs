use serde_json::Value;
use std::fmt::{Display, Formatter};

pub mod fetcher;
pub mod http;

pub use fetcher::Fetcher;
pub use http::HttpTransport;

/// A response as it came off the wire, body fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the media type is `application/json`, ignoring parameters
    /// such as `charset`.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|content_type| {
                content_type
                    .split(';')
                    .next()
                    .unwrap_or(content_type)
                    .trim()
                    .eq_ignore_ascii_case("application/json")
            })
            .unwrap_or(false)
    }
}

/// What a fetch resolves to. Bodies served with any other content type than
/// JSON are handed back untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Json(Value),
    Raw {
        content_type: Option<String>,
        body: Vec<u8>,
    },
}

#[derive(Debug)]
pub enum FetchError {
    Encode(serde_json::Error),
    Transport(String),
    Timeout(String),
    RetriesExhausted {
        attempts: u32,
        source: serde_json::Error,
    },
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode request body: {}", err),
            Self::Transport(message) => write!(f, "request failed: {}", message),
            Self::Timeout(message) => write!(f, "request timed out: {}", message),
            Self::RetriesExhausted { attempts, source } => write!(
                f,
                "response was not valid JSON after {} attempts: {}",
                attempts, source
            ),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::RetriesExhausted { source, .. } => Some(source),
            Self::Transport(_) | Self::Timeout(_) => None,
        }
    }
}

/// Sends one POST with a JSON body and buffers the whole response.
pub trait Transport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<RawResponse, FetchError>;
}
