//! Shared helpers for tlsetup integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use rustls::pki_types::CertificateDer;
use tlsetup::SystemRoots;

/// Path of a fixture under `tests/data`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

/// Certificates parsed from a fixture.
pub fn certs_in(name: &str) -> Vec<CertificateDer<'static>> {
    let bytes = std::fs::read(fixture(name)).expect("Failed to read fixture");
    rustls_pemfile::certs(&mut bytes.as_slice())
        .collect::<Result<_, _>>()
        .expect("Fixture is not certificate PEM")
}

/// A deterministic platform store.
pub struct FixedRoots(pub Vec<CertificateDer<'static>>);

impl FixedRoots {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_fixture(name: &str) -> Self {
        Self(certs_in(name))
    }
}

impl SystemRoots for FixedRoots {
    fn certificates(&self) -> Vec<CertificateDer<'static>> {
        self.0.clone()
    }
}
