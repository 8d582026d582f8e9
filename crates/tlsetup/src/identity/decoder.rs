//! Private key decoding.
//!
//! A key PEM block is handed to one of two decoders, picked by its headers:
//! blocks carrying `DEK-Info` go to [`LegacyEncryptedKeyDecoder`],
//! everything else to [`PlainKeyDecoder`], which ignores any password.

use super::legacy::{self, DekInfo, DEK_INFO};
use crate::error::TlsSetupError;
use pem::Pem;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer};
use tlsetup_common_secret::SecretString;

/// Turns a PEM key block into key material rustls understands.
pub trait KeyDecoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decode `block`, using `password` if the block needs one.
    fn decode(
        &self,
        block: &Pem,
        password: Option<&SecretString>,
    ) -> Result<PrivateKeyDer<'static>, TlsSetupError>;
}

/// Decoder for unencrypted keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainKeyDecoder;

/// Decoder for RFC 1423 encrypted keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyEncryptedKeyDecoder;

/// True if the block is a legacy encrypted PEM block.
pub fn is_encrypted(block: &Pem) -> bool {
    block.headers().get(DEK_INFO).is_some()
}

/// Pick the decoder matching the block's headers.
pub fn decoder_for(block: &Pem) -> &'static dyn KeyDecoder {
    if is_encrypted(block) {
        &LegacyEncryptedKeyDecoder
    } else {
        &PlainKeyDecoder
    }
}

fn key_from_der(tag: &str, der: Vec<u8>) -> Result<PrivateKeyDer<'static>, TlsSetupError> {
    match tag {
        "RSA PRIVATE KEY" => Ok(PrivatePkcs1KeyDer::from(der).into()),
        "EC PRIVATE KEY" => Ok(PrivateSec1KeyDer::from(der).into()),
        "PRIVATE KEY" => Ok(PrivatePkcs8KeyDer::from(der).into()),
        "ENCRYPTED PRIVATE KEY" => Err(TlsSetupError::KeyDecryption(
            "PKCS#8 encrypted keys are not supported, convert the key to a legacy encrypted PEM".into(),
        )),
        other => Err(TlsSetupError::KeyCertMismatch(format!(
            "unsupported private key block {other:?}"
        ))),
    }
}

impl KeyDecoder for PlainKeyDecoder {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn decode(
        &self,
        block: &Pem,
        _password: Option<&SecretString>,
    ) -> Result<PrivateKeyDer<'static>, TlsSetupError> {
        key_from_der(block.tag(), block.contents().to_vec())
    }
}

impl KeyDecoder for LegacyEncryptedKeyDecoder {
    fn name(&self) -> &'static str {
        "legacy-encrypted"
    }

    fn decode(
        &self,
        block: &Pem,
        password: Option<&SecretString>,
    ) -> Result<PrivateKeyDer<'static>, TlsSetupError> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TlsSetupError::KeyDecryption("private key is encrypted but no password was given".into()))?;

        let header = block
            .headers()
            .get(DEK_INFO)
            .ok_or_else(|| TlsSetupError::KeyDecryption(format!("missing {DEK_INFO} header")))?;
        let dek = DekInfo::parse(header).map_err(TlsSetupError::KeyDecryption)?;

        let plaintext = legacy::decrypt(&dek, password.as_bytes(), block.contents())
            .ok_or_else(|| TlsSetupError::KeyDecryption("incorrect password".into()))?;

        key_from_der(block.tag(), plaintext.to_vec())
    }
}
