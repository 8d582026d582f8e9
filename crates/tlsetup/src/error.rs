//! Error types for the configuration builders.

use std::fmt;
use std::path::PathBuf;

/// Everything that can go wrong while assembling an endpoint configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsSetupError {
    #[error("identity is required but no certificate or key file was given")]
    MissingRequiredIdentity,

    #[error("incomplete identity: {missing} file path is missing")]
    IncompleteIdentity { missing: &'static str },

    #[error("failed to load CA certificates from {path}: {reason}")]
    CaParse { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    IdentityRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decrypt private key: {0}")]
    KeyDecryption(String),

    #[error("certificate and private key do not form a valid pair: {0}")]
    KeyCertMismatch(String),

    #[error("unrecognized TLS version name: {0:?}")]
    UnrecognizedVersionName(String),

    #[error("minimum TLS version {min} is greater than maximum {max}")]
    VersionRangeOrder { min: String, max: String },

    #[error("no TLS version between {min} and {max} is supported by the TLS engine")]
    NoSupportedVersion { min: String, max: String },

    #[error("TLS engine rejected the configuration: {0}")]
    Engine(String),
}

impl From<rustls::Error> for TlsSetupError {
    fn from(err: rustls::Error) -> Self {
        Self::Engine(err.to_string())
    }
}

/// A failed build together with the state it left behind.
///
/// Builders never leave the caller guessing: on failure the error carries
/// exactly the state that should be installed in its place.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Rejected<S: fmt::Debug> {
    /// Why the build failed.
    #[source]
    pub error: TlsSetupError,
    /// State preceding the failed step.
    pub state: S,
}

impl<S: fmt::Debug> Rejected<S> {
    pub(crate) fn new(error: TlsSetupError, state: S) -> Self {
        Self { error, state }
    }

    /// Split into the error and the preceding state.
    pub fn into_parts(self) -> (TlsSetupError, S) {
        (self.error, self.state)
    }
}

/// Result alias for the builders.
pub type Result<T> = std::result::Result<T, TlsSetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_inner_error() {
        let rejected = Rejected::new(TlsSetupError::MissingRequiredIdentity, 3usize);
        assert_eq!(
            rejected.to_string(),
            "identity is required but no certificate or key file was given"
        );
        let (error, state) = rejected.into_parts();
        assert!(matches!(error, TlsSetupError::MissingRequiredIdentity));
        assert_eq!(state, 3);
    }

    #[test]
    fn test_rejected_exposes_source() {
        use std::error::Error;
        let rejected = Rejected::new(TlsSetupError::KeyDecryption("bad".into()), ());
        assert!(rejected.source().is_some());
    }

    #[test]
    fn test_rustls_error_maps_to_engine() {
        let err: TlsSetupError = rustls::Error::General("boom".into()).into();
        assert!(matches!(err, TlsSetupError::Engine(msg) if msg.contains("boom")));
    }
}
