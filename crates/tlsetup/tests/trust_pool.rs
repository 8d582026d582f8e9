mod common;

use std::path::Path;

use common::{certs_in, fixture, FixedRoots};
use tlsetup::{build_trust_pool, build_trust_pool_with, NativeRoots, TlsSetupError, TrustPool};
use tlsetup_test_utils::{assert_err, assert_ok, concat_files, temp_dir};

fn system_len() -> usize {
    TrustPool::from_system(&NativeRoots).len()
}

#[test]
fn test_pool_sizes_against_platform_store() {
    let system = system_len();
    let cases: Vec<(&str, bool, usize)> = vec![
        ("", false, 0),
        ("ca.pem", false, 1),
        ("", true, system),
        ("ca.pem", true, system + 1),
        ("cert.crt", false, 1),
    ];

    for (name, use_system, expected) in cases {
        let path = if name.is_empty() { None } else { Some(fixture(name)) };
        let pool = assert_ok!(build_trust_pool(path.as_deref(), use_system));
        assert_eq!(pool.len(), expected, "ca_file={name:?} use_system={use_system}");
    }
}

#[test]
fn test_file_adds_to_platform_store() {
    let roots = FixedRoots::from_fixture("ca_b.pem");
    for (name, added) in [("ca.pem", 1), ("cert.crt", 1), ("ca_bundle.pem", 1)] {
        let path = fixture(name);
        let pool = assert_ok!(build_trust_pool_with(&roots, Some(path.as_path()), true));
        assert_eq!(pool.len(), 1 + added, "{name}");
    }
}

#[test]
fn test_invalid_file_leaves_starting_pool() {
    let roots = FixedRoots::from_fixture("ca_bundle.pem");
    for name in ["ca_corrupt.pem", "cert.csr", "cert.key", "not_pem.txt"] {
        let path = fixture(name);

        let rejected = assert_err!(build_trust_pool_with(&roots, Some(path.as_path()), false));
        assert!(matches!(rejected.error, TlsSetupError::CaParse { .. }), "{name}");
        assert!(rejected.state.is_empty(), "{name}");

        let rejected = assert_err!(build_trust_pool_with(&roots, Some(path.as_path()), true));
        assert_eq!(rejected.state.len(), 2, "{name}");
    }
}

#[test]
fn test_missing_file_is_a_parse_error() {
    let rejected = assert_err!(build_trust_pool_with(
        &FixedRoots::empty(),
        Some(Path::new("/nonexistent/ca.pem")),
        false
    ));
    let (error, state) = rejected.into_parts();
    assert!(error.to_string().contains("/nonexistent/ca.pem"));
    assert!(state.is_empty());
}

#[test]
fn test_bundle_with_one_bad_certificate_adds_nothing() {
    let dir = temp_dir();
    let bundle = concat_files(
        dir.path(),
        "bundle.pem",
        &[fixture("ca_b.pem").as_path(), fixture("ca_corrupt.pem").as_path()],
    );

    let rejected = assert_err!(build_trust_pool_with(
        &FixedRoots::from_fixture("ca.pem"),
        Some(bundle.as_path()),
        true
    ));
    assert_eq!(rejected.state.len(), 1);
    assert!(rejected.state.contains(&certs_in("ca.pem")[0]));
    assert!(!rejected.state.contains(&certs_in("ca_b.pem")[0]));
}

#[test]
fn test_pool_feeds_root_store() {
    let path = fixture("ca_bundle.pem");
    let pool = assert_ok!(build_trust_pool_with(&FixedRoots::empty(), Some(path.as_path()), false));
    assert_eq!(pool.root_store().len(), 2);
    for cert in certs_in("ca_bundle.pem") {
        assert!(pool.contains(&cert));
    }
}
