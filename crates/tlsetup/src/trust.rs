//! CA trust pool assembly.
//!
//! A pool starts either empty or as a copy of the platform trust store and
//! is then extended with the certificates of an optional PEM file. Appending
//! a file is all-or-nothing: one bad certificate rejects the whole file and
//! the pool keeps its previous contents.

use crate::error::{Rejected, TlsSetupError};
use once_cell::sync::Lazy;
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Source of the platform's trusted root certificates.
pub trait SystemRoots: Send + Sync {
    /// DER certificates of the platform store. May be empty.
    fn certificates(&self) -> Vec<CertificateDer<'static>>;
}

/// The operating system trust store, loaded once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRoots;

static NATIVE_ROOTS: Lazy<Vec<CertificateDer<'static>>> = Lazy::new(|| {
    let result = rustls_native_certs::load_native_certs();
    for error in &result.errors {
        warn!(error = %error, "Failed to load part of the system trust store");
    }
    debug!(count = result.certs.len(), "Loaded system trust store");
    result.certs
});

impl SystemRoots for NativeRoots {
    fn certificates(&self) -> Vec<CertificateDer<'static>> {
        NATIVE_ROOTS.clone()
    }
}

/// Set of CA certificates used to validate peer certificates.
#[derive(Clone)]
pub struct TrustPool {
    roots: RootCertStore,
    members: HashSet<Vec<u8>>,
}

impl Default for TrustPool {
    fn default() -> Self {
        Self {
            roots: RootCertStore::empty(),
            members: HashSet::new(),
        }
    }
}

fn der<'a>(cert: &'a CertificateDer<'_>) -> &'a [u8] {
    cert.as_ref()
}

impl fmt::Debug for TrustPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustPool").field("len", &self.len()).finish()
    }
}

impl TrustPool {
    /// An empty pool.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A copy of the given platform store.
    ///
    /// Platform entries that do not parse as trust anchors are skipped.
    pub fn from_system(system: &dyn SystemRoots) -> Self {
        let mut pool = Self::empty();
        let mut skipped = 0usize;

        for cert in system.certificates() {
            if pool.members.contains(der(&cert)) {
                continue;
            }
            let bytes = der(&cert).to_vec();
            match pool.roots.add(cert) {
                Ok(()) => {
                    pool.members.insert(bytes);
                }
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Ignored unparsable system root certificates");
        }
        pool
    }

    /// Number of distinct certificates in the pool.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the pool holds no certificate.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if this exact certificate is in the pool.
    pub fn contains(&self, cert: &CertificateDer<'_>) -> bool {
        self.members.contains(der(cert))
    }

    /// Trust anchors for rustls verifiers.
    pub fn root_store(&self) -> &RootCertStore {
        &self.roots
    }

    /// Append every certificate of a PEM document.
    ///
    /// Returns how many new certificates were added. On error nothing is
    /// added.
    pub fn append_pem(&mut self, pem: &[u8]) -> Result<usize, String> {
        let mut reader = pem;
        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid PEM data: {e}"))?;

        if certs.is_empty() {
            return Err("no PEM certificate found".to_string());
        }

        let mut staged = RootCertStore::empty();
        let mut fresh: Vec<CertificateDer<'static>> = Vec::new();

        for (index, cert) in certs.into_iter().enumerate() {
            if self.members.contains(der(&cert)) || fresh.contains(&cert) {
                continue;
            }
            staged
                .add(cert.clone())
                .map_err(|e| format!("certificate #{} is not a valid CA certificate: {e}", index + 1))?;
            fresh.push(cert);
        }

        let added = fresh.len();
        self.roots.roots.extend(staged.roots);
        self.members.extend(fresh.iter().map(|cert| der(cert).to_vec()));
        Ok(added)
    }
}

/// Build a trust pool from the platform store and an optional CA file.
pub fn build_trust_pool(
    ca_file: Option<&Path>,
    use_system_ca: bool,
) -> Result<TrustPool, Rejected<TrustPool>> {
    build_trust_pool_with(&NativeRoots, ca_file, use_system_ca)
}

/// [`build_trust_pool`] with an explicit platform store.
///
/// On failure the rejected state is the starting pool: the platform
/// certificates if requested, otherwise empty.
pub fn build_trust_pool_with(
    system: &dyn SystemRoots,
    ca_file: Option<&Path>,
    use_system_ca: bool,
) -> Result<TrustPool, Rejected<TrustPool>> {
    let mut pool = if use_system_ca {
        TrustPool::from_system(system)
    } else {
        TrustPool::empty()
    };

    let Some(path) = ca_file.filter(|p| !p.as_os_str().is_empty()) else {
        debug!(len = pool.len(), "No CA file configured");
        return Ok(pool);
    };

    let ca_error = |reason: String| TlsSetupError::CaParse {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return Err(Rejected::new(ca_error(e.to_string()), pool)),
    };

    match pool.append_pem(&bytes) {
        Ok(added) => {
            info!(path = %path.display(), added, len = pool.len(), "Loaded CA certificates");
            Ok(pool)
        }
        Err(reason) => Err(Rejected::new(ca_error(reason), pool)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedRoots(Vec<CertificateDer<'static>>);

    impl SystemRoots for FixedRoots {
        fn certificates(&self) -> Vec<CertificateDer<'static>> {
            self.0.clone()
        }
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
    }

    fn certs_in(name: &str) -> Vec<CertificateDer<'static>> {
        let bytes = std::fs::read(fixture(name)).unwrap();
        rustls_pemfile::certs(&mut bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn one_root() -> FixedRoots {
        FixedRoots(certs_in("ca_b.pem"))
    }

    #[test]
    fn test_no_file_no_system_is_empty() {
        let pool = build_trust_pool_with(&one_root(), None, false).unwrap();
        assert!(pool.is_empty());

        let empty = PathBuf::new();
        let pool = build_trust_pool_with(&one_root(), Some(empty.as_path()), false).unwrap();
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_system_only() {
        let pool = build_trust_pool_with(&one_root(), None, true).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_file_extends_system() {
        let path = fixture("ca.pem");
        let pool = build_trust_pool_with(&one_root(), Some(path.as_path()), true).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.root_store().len(), 2);
    }

    #[test]
    fn test_duplicates_are_not_added_twice() {
        let path = fixture("ca_bundle.pem");
        let pool = build_trust_pool_with(&one_root(), Some(path.as_path()), true).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&certs_in("ca.pem")[0]));
    }

    #[test]
    fn test_failed_append_keeps_starting_pool() {
        for name in ["ca_corrupt.pem", "cert.csr", "not_pem.txt", "missing.pem"] {
            let path = fixture(name);
            let rejected = build_trust_pool_with(&one_root(), Some(path.as_path()), true).unwrap_err();
            assert!(matches!(rejected.error, TlsSetupError::CaParse { .. }), "{name}");
            assert_eq!(rejected.state.len(), 1, "{name}");
        }
    }

    #[test]
    fn test_append_is_all_or_nothing() {
        let mut bundle = std::fs::read(fixture("ca.pem")).unwrap();
        bundle.extend(std::fs::read(fixture("ca_corrupt.pem")).unwrap());

        let mut pool = TrustPool::empty();
        assert!(pool.append_pem(&bundle).is_err());
        assert!(pool.is_empty());
        assert!(pool.root_store().is_empty());
    }

    #[test]
    fn test_unparsable_system_roots_are_skipped() {
        let mut certs = certs_in("ca_b.pem");
        certs.push(CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00]));
        let pool = TrustPool::from_system(&FixedRoots(certs));
        assert_eq!(pool.len(), 1);
    }
}
