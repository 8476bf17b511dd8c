//! Common error types for mediasync

use thiserror::Error;

/// Common result type for mediasync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters of an upstream body kept in an error
const BODY_EXCERPT_CHARS: usize = 300;

/// Error kinds shared by the feed reader, sync job and backfill job
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration value (fatal, raised before any request)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feed could not be downloaded (network failure or non-2xx status)
    #[error("Feed fetch failed: {0}")]
    FeedFetch(String),

    /// Feed body could not be parsed at all
    #[error("Failed to parse feed: {0}")]
    FeedParse(String),

    /// One metadata batch request failed
    #[error("Metadata batch {batch} failed: {message}")]
    EnrichmentBatch { batch: usize, message: String },

    /// Store rejected a write (upsert or patch)
    #[error("Store write failed {status}: {body}")]
    StoreWrite { status: u16, body: String },

    /// Store rejected a read query
    #[error("Store query failed {status}: {body}")]
    StoreQuery { status: u16, body: String },

    /// HTTP client could not be constructed or a request never got a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config file could not be decoded
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Process exit code for this error when it ends a run.
    ///
    /// Configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Exit code for an `anyhow` chain whose root cause may be a mediasync error
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(1)
}

/// Truncate an upstream response body for inclusion in an error message
pub fn body_excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let mut excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        excerpt.push('…');
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_two() {
        assert_eq!(Error::Config("missing".into()).exit_code(), 2);
        assert_eq!(Error::FeedParse("bad".into()).exit_code(), 1);
        assert_eq!(
            Error::StoreWrite {
                status: 500,
                body: "boom".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let err = anyhow::Error::new(Error::Config("no key".into())).context("loading config");
        assert_eq!(exit_code_for(&err), 2);

        let other = anyhow::anyhow!("plain failure");
        assert_eq!(exit_code_for(&other), 1);
    }

    #[test]
    fn test_body_excerpt_truncates_long_bodies() {
        let short = "short body";
        assert_eq!(body_excerpt(short), short);

        let long = "x".repeat(1000);
        let excerpt = body_excerpt(&long);
        assert_eq!(excerpt.chars().count(), BODY_EXCERPT_CHARS + 1);
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn test_store_write_message_carries_status_and_body() {
        let err = Error::StoreWrite {
            status: 409,
            body: "duplicate key".into(),
        };
        assert_eq!(err.to_string(), "Store write failed 409: duplicate key");
    }
}
