//! Settings validation.
//!
//! Structural checks that need no file access. File contents are checked
//! later by the builders.

use super::types::{ClientAuth, TlsSettings};
use crate::version::TlsVersion;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("certificate file given without a key file")]
    MissingKeyFile,

    #[error("key file given without a certificate file")]
    MissingCertFile,

    #[error("identity required but no certificate/key files configured")]
    MissingIdentity,

    #[error("client certificates required but no CA source configured")]
    MissingClientCa,

    #[error("unrecognized {field} {value:?}")]
    InvalidVersion { field: &'static str, value: String },
}

fn is_set(path: Option<&PathBuf>) -> bool {
    path.is_some_and(|p| !p.as_os_str().is_empty())
}

/// Validate settings, collecting every problem found.
pub fn validate_settings(settings: &TlsSettings) -> Result<(), Vec<SettingsError>> {
    let mut errors = Vec::new();

    match (is_set(settings.cert_file.as_ref()), is_set(settings.key_file.as_ref())) {
        (true, false) => errors.push(SettingsError::MissingKeyFile),
        (false, true) => errors.push(SettingsError::MissingCertFile),
        (false, false) if settings.identity_required => errors.push(SettingsError::MissingIdentity),
        _ => {}
    }

    if settings.client_auth != ClientAuth::None && !settings.use_system_ca && !is_set(settings.ca_file.as_ref()) {
        errors.push(SettingsError::MissingClientCa);
    }

    for (field, value) in [
        ("min_version", &settings.min_version),
        ("max_version", &settings.max_version),
    ] {
        if !value.is_empty() && TlsVersion::from_name(value).is_none() {
            errors.push(SettingsError::InvalidVersion {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
