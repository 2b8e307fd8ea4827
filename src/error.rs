// src/error.rs
// =============================================================================
// Error types shared by every scanning module.
//
// Kinds of failure:
// - Config: bad user input (domain, proxy, pool size). Raised before any
//   network activity happens.
// - Transport: the HTTP request never produced a response (DNS, connect,
//   timeout). A 404 is NOT a transport error, it is a normal Resource.
// - Parse: a robots.txt entry could not be parsed as a URL reference.
// - Io: writing fetched bodies or the success list failed.
// - ChannelClosed: a result could not be handed over because the receiver
//   is gone.
//
// The application layer (main.rs) wraps these in anyhow for context.
// =============================================================================

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Every error the scanner can produce.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid configuration value (proxy address, domain, worker count)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request did not get any HTTP response back
    #[error("failed to fetch {url} ({kind}): {source}")]
    Transport {
        url: String,
        kind: TransportKind,
        #[source]
        source: reqwest::Error,
    },

    /// A Disallow entry is not a valid URL reference
    #[error("robots.txt line {line}: cannot parse '{fragment}': {source}")]
    Parse {
        line: usize,
        fragment: String,
        #[source]
        source: FragmentError,
    },

    /// The receiving side of a result channel went away
    #[error("result channel closed before {0} could be delivered")]
    ChannelClosed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Builds a transport error, classifying the underlying reqwest failure
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let kind = TransportKind::classify(&source);
        ScanError::Transport {
            url: url.into(),
            kind,
            source,
        }
    }

    /// The transport classification, if this is a transport error
    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            ScanError::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Why a Disallow fragment was rejected as a URL reference
#[derive(Debug, Error, PartialEq)]
pub enum FragmentError {
    /// A '%' not followed by two hex digits
    #[error("invalid URL escape \"{0}\"")]
    BadEscape(String),

    /// The reference starts with ':'
    #[error("missing protocol scheme")]
    MissingScheme,

    /// A relative reference whose first segment contains ':'
    #[error("first path segment in URL cannot contain colon")]
    ColonInFirstSegment,

    #[error("invalid control character in URL")]
    ControlCharacter,

    /// Rejected by reference resolution (bad port, bad host, ...)
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Why a request failed to reach a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Request timed out
    Timeout,
    /// Could not resolve hostname
    Dns,
    /// Connection refused or reset
    Connect,
    /// Anything else reqwest reports (TLS, redirect loops, body errors)
    Other,
}

impl TransportKind {
    // reqwest only exposes a few predicates, so DNS failures are recognised
    // from the error chain text.
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return TransportKind::Timeout;
        }

        if error.is_connect() {
            let chain = error_chain(error).to_lowercase();
            if chain.contains("dns") || chain.contains("resolve") {
                return TransportKind::Dns;
            }
            return TransportKind::Connect;
        }

        TransportKind::Other
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportKind::Timeout => "timed out",
            TransportKind::Dns => "dns error",
            TransportKind::Connect => "connection failed",
            TransportKind::Other => "request error",
        };
        f.write_str(label)
    }
}

// Flattens an error and all of its sources into one string
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_labels() {
        assert_eq!(TransportKind::Timeout.to_string(), "timed out");
        assert_eq!(TransportKind::Dns.to_string(), "dns error");
        assert_eq!(TransportKind::Connect.to_string(), "connection failed");
    }

    #[test]
    fn test_parse_error_mentions_line() {
        let source = url::Url::parse("http://example.com:99999").unwrap_err();
        let err = ScanError::Parse {
            line: 3,
            fragment: "//example.com:99999".to_string(),
            source: source.into(),
        };
        let message = err.to_string();
        assert!(message.contains("line 3"));
        assert!(message.contains("//example.com:99999"));
        assert_eq!(err.transport_kind(), None);
    }

    #[test]
    fn test_fragment_error_messages() {
        let err = ScanError::Parse {
            line: 1,
            fragment: "%zz".to_string(),
            source: FragmentError::BadEscape("%zz".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "robots.txt line 1: cannot parse '%zz': invalid URL escape \"%zz\""
        );
        assert_eq!(
            FragmentError::MissingScheme.to_string(),
            "missing protocol scheme"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ScanError::Config("bad proxy".to_string());
        assert_eq!(err.to_string(), "invalid configuration: bad proxy");
    }
}
