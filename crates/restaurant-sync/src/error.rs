//! Error types for restaurant-sync.

use restaurant_types::ValidationError;

/// Boxed cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for restaurant-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the gateway and the sync coordinator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote API could not be reached.
    #[error("Remote API not reachable at {url}: {source}")]
    NetworkUnavailable {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The remote API answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote API sent a body that does not decode.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The configured API URL is not usable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A review draft failed validation. Nothing was stored or sent.
    #[error("Invalid review: {0}")]
    InvalidReview(#[from] ValidationError),

    /// Offline and the data is not in the local cache.
    #[error("Offline and {0} not cached")]
    Offline(String),

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Local store failure.
    #[error("Store error: {0}")]
    Store(#[from] restaurant_store::Error),
}

impl Error {
    /// Transport-level failure, as opposed to an answer from the server.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ServerError {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (500): Internal Server Error");

        let err = Error::Offline("restaurant list".to_string());
        assert_eq!(err.to_string(), "Offline and restaurant list not cached");
    }

    #[test]
    fn test_invalid_review_from_validation() {
        let err: Error = ValidationError::EmptyName.into();
        assert!(matches!(err, Error::InvalidReview(ValidationError::EmptyName)));
        assert!(!err.is_network());
    }

    #[test]
    fn test_network_unavailable_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::NetworkUnavailable {
            url: "http://localhost:1337/restaurants".to_string(),
            source: Box::new(cause),
        };
        assert!(err.is_network());
        assert!(std::error::Error::source(&err).is_some());
    }
}
