//! Settings types.

use super::validation::{validate_settings, SettingsError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tlsetup_common_secret::SecretString;

/// File-based inputs for one TLS endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// PEM file with additional trusted CA certificates.
    pub ca_file: Option<PathBuf>,
    /// Start the trust pool from the platform trust store.
    pub use_system_ca: bool,
    /// Certificate chain (leaf first) presented to peers.
    pub cert_file: Option<PathBuf>,
    /// Private key for the leaf certificate.
    pub key_file: Option<PathBuf>,
    /// Password for a legacy encrypted key. Ignored for plain keys.
    pub key_password: Option<SecretString>,
    /// Fail when no identity is configured.
    pub identity_required: bool,
    /// Minimum protocol version name, e.g. `TLS12`. Empty for the default.
    pub min_version: String,
    /// Maximum protocol version name, e.g. `TLS13`. Empty for the default.
    pub max_version: String,
    /// Peer certificate policy on the server side.
    pub client_auth: ClientAuth,
    /// ALPN protocol names offered or accepted, in preference order.
    pub alpn_protocols: Vec<String>,
}

/// Whether a server asks clients for a certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuth {
    /// No client certificate requested.
    #[default]
    None,
    /// Verified when presented, anonymous clients allowed.
    Optional,
    /// Every client must present a certificate chaining to the trust pool.
    Required,
}

impl TlsSettings {
    /// Settings for a server presenting `cert_file`/`key_file`.
    pub fn server(cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        Self {
            cert_file: Some(cert_file.into()),
            key_file: Some(key_file.into()),
            identity_required: true,
            ..Default::default()
        }
    }

    /// Settings for a client trusting the platform store.
    pub fn client() -> Self {
        Self {
            use_system_ca: true,
            ..Default::default()
        }
    }

    /// Structural checks, see [`validate_settings`].
    pub fn validate(&self) -> Result<(), Vec<SettingsError>> {
        validate_settings(self)
    }

    /// ALPN names as wire bytes.
    pub fn alpn_wire(&self) -> Vec<Vec<u8>> {
        self.alpn_protocols
            .iter()
            .map(|p| p.as_bytes().to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_empty() {
        let settings = TlsSettings::default();
        assert!(settings.ca_file.is_none());
        assert!(!settings.use_system_ca);
        assert!(!settings.identity_required);
        assert!(settings.min_version.is_empty());
        assert_eq!(settings.client_auth, ClientAuth::None);
    }

    #[test]
    fn test_partial_json_merges_with_defaults() {
        let settings: TlsSettings = serde_json::from_str(
            r#"{"cert_file": "server.crt", "key_file": "server.key", "key_password": "test", "client_auth": "required"}"#,
        )
        .unwrap();

        assert_eq!(settings.cert_file, Some(PathBuf::from("server.crt")));
        assert_eq!(settings.key_password.as_ref().map(|p| p.expose().as_str()), Some("test"));
        assert_eq!(settings.client_auth, ClientAuth::Required);
        assert!(settings.max_version.is_empty());
    }

    #[test]
    fn test_serialized_settings_redact_password() {
        let settings = TlsSettings {
            key_password: Some(SecretString::from("test")),
            ..TlsSettings::server("a.crt", "a.key")
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("\"test\""));
    }

    #[test]
    fn test_alpn_wire() {
        let settings = TlsSettings {
            alpn_protocols: vec!["h2".into(), "http/1.1".into()],
            ..Default::default()
        };
        assert_eq!(settings.alpn_wire(), vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
    }
}
