//! Local identity loading: certificate chain plus private key.
//!
//! The certificate file holds the leaf certificate optionally followed by
//! intermediates; the key file holds one private key, possibly encrypted
//! with a password (see [`decoder`]). A pair is only accepted when the
//! leaf's public key matches the private key.

pub mod decoder;
pub mod legacy;

use crate::error::{Result, TlsSetupError};
use decoder::{decoder_for, is_encrypted};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tlsetup_common_secret::SecretString;
use tracing::{debug, info};

/// A verified certificate chain and its private key.
pub struct Identity {
    certified: Arc<CertifiedKey>,
    key: PrivateKeyDer<'static>,
}

impl Identity {
    /// Leaf certificate followed by any intermediates.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.certified.cert
    }

    /// The certificate whose key this identity holds.
    pub fn leaf(&self) -> &CertificateDer<'static> {
        // A chain is never empty once constructed.
        &self.certified.cert[0]
    }

    /// Private key in its on-disk encoding, decrypted.
    pub fn key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }

    /// Chain and signing key as used by rustls certificate resolvers.
    pub fn certified_key(&self) -> Arc<CertifiedKey> {
        Arc::clone(&self.certified)
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Self {
            certified: Arc::clone(&self.certified),
            key: self.key.clone_key(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("chain_len", &self.chain().len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| TlsSetupError::IdentityRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the identity named by `cert_file` and `key_file`.
///
/// With neither path given this yields `Ok(None)`, or
/// [`TlsSetupError::MissingRequiredIdentity`] when `required` is set.
pub fn load_identity(
    required: bool,
    cert_file: Option<&Path>,
    key_file: Option<&Path>,
    key_password: Option<&SecretString>,
) -> Result<Option<Identity>> {
    let (cert_file, key_file) = match (non_empty(cert_file), non_empty(key_file)) {
        (None, None) if required => return Err(TlsSetupError::MissingRequiredIdentity),
        (None, None) => {
            debug!("No identity configured");
            return Ok(None);
        }
        (Some(_), None) => return Err(TlsSetupError::IncompleteIdentity { missing: "key" }),
        (None, Some(_)) => {
            return Err(TlsSetupError::IncompleteIdentity {
                missing: "certificate",
            })
        }
        (Some(cert), Some(key)) => (cert, key),
    };

    let cert_pem = read(cert_file)?;
    let key_pem = read(key_file)?;
    let identity = identity_from_pem(&cert_pem, &key_pem, key_password)?;

    info!(
        cert = %cert_file.display(),
        key = %key_file.display(),
        chain_len = identity.chain().len(),
        "Loaded identity"
    );
    Ok(Some(identity))
}

/// Build an identity from in-memory PEM documents.
pub fn identity_from_pem(
    cert_pem: &[u8],
    key_pem: &[u8],
    key_password: Option<&SecretString>,
) -> Result<Identity> {
    let mut reader = cert_pem;
    let chain = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TlsSetupError::KeyCertMismatch(format!("invalid certificate PEM: {e}")))?;
    if chain.is_empty() {
        return Err(TlsSetupError::KeyCertMismatch("no certificate found".into()));
    }

    let blocks = pem::parse_many(key_pem)
        .map_err(|e| TlsSetupError::KeyCertMismatch(format!("invalid private key PEM: {e}")))?;
    let block = blocks
        .iter()
        .find(|b| b.tag().ends_with("PRIVATE KEY"))
        .ok_or_else(|| TlsSetupError::KeyCertMismatch("no private key found".into()))?;

    let decoder = decoder_for(block);
    debug!(decoder = decoder.name(), tag = block.tag(), "Decoding private key");
    if !is_encrypted(block) && key_password.is_some_and(|p| !p.is_empty()) {
        debug!("Private key is not encrypted, ignoring the configured password");
    }
    let key = decoder.decode(block, key_password)?;

    let certified = certify(chain, &key, &rustls::crypto::ring::default_provider())?;
    Ok(Identity {
        certified: Arc::new(certified),
        key,
    })
}

/// SubjectPublicKeyInfo of a certificate, as encoded in it.
///
/// Only the structure is parsed, so legacy v1 certificates are accepted.
fn leaf_public_key<'a>(leaf: &'a CertificateDer<'_>) -> Result<&'a [u8]> {
    let (_, cert) = x509_parser::parse_x509_certificate(leaf.as_ref())
        .map_err(|e| TlsSetupError::KeyCertMismatch(format!("invalid leaf certificate: {e}")))?;
    Ok(cert.tbs_certificate.subject_pki.raw)
}

/// Pair the chain with the key, checking that the leaf matches the key.
fn certify(
    chain: Vec<CertificateDer<'static>>,
    key: &PrivateKeyDer<'static>,
    provider: &CryptoProvider,
) -> Result<CertifiedKey> {
    let signing_key = provider
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| TlsSetupError::KeyCertMismatch(format!("unusable private key: {e}")))?;

    let leaf = chain
        .first()
        .ok_or_else(|| TlsSetupError::KeyCertMismatch("no certificate found".into()))?;
    let leaf_spki = leaf_public_key(leaf)?;
    let matches = match signing_key.public_key() {
        Some(key_spki) => key_spki.as_ref() == leaf_spki,
        None => {
            return Err(TlsSetupError::KeyCertMismatch(
                "public key cannot be derived from the private key".into(),
            ))
        }
    };
    if !matches {
        return Err(TlsSetupError::KeyCertMismatch(
            "private key does not belong to the leaf certificate".into(),
        ));
    }

    Ok(CertifiedKey::new(chain, signing_key))
}
