//! Error types for the `relay` crate.
use std::error::Error as StdError;
use std::fmt;

/// Root error of the relay. `source` holds the Redis or serde error, if any.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: RelayErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum RelayErrorKind {
    /// The Redis server could not be reached or the subscription failed.
    Connection,
    /// A message could not be published to the channel.
    Publish,
    /// A payload could not be encoded or decoded.
    Payload,
}

impl Error {
    pub fn connection(err: redis::RedisError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: RelayErrorKind::Connection,
        }
    }

    pub fn publish(err: redis::RedisError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: RelayErrorKind::Publish,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Relay Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Relay Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: RelayErrorKind::Payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_errors_display_their_source() {
        let err = Error::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(err.error_kind, RelayErrorKind::Payload);
        assert!(err.to_string().starts_with("Relay Error (Payload): "));
        assert!(err.source().is_some());
    }
}
