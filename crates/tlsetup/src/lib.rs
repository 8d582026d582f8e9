//! tlsetup - validated TLS endpoint configuration from PEM files
//!
//! Three builders turn file-based settings into the pieces a TLS endpoint
//! needs:
//!
//! - **Trust pool**: platform roots plus an optional CA file ([`trust`])
//! - **Identity**: certificate chain and private key, optionally a legacy
//!   password-encrypted key, checked to belong together ([`identity`])
//! - **Version range**: case-insensitive protocol version names resolved to
//!   an ordered range ([`version`])
//!
//! Each builder returns either the new state or a [`Rejected`] carrying the
//! error and the state to keep instead. [`EndpointConfig`] collects the
//! results and assembles rustls client and server configurations.

#![warn(clippy::all)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod trust;
pub mod version;

pub use config::{load_settings, ClientAuth, SettingsLoader, TlsSettings};
pub use endpoint::EndpointConfig;
pub use error::{Rejected, Result, TlsSetupError};
pub use identity::{identity_from_pem, load_identity, Identity};
pub use trust::{build_trust_pool, build_trust_pool_with, NativeRoots, SystemRoots, TrustPool};
pub use version::{resolve_version_range, TlsVersion, VersionRange};
