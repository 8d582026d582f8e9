//! Caller-owned endpoint configuration and rustls assembly.
//!
//! [`EndpointConfig`] holds the three pieces the builders produce. Each
//! `install_*` method runs one builder and stores whatever state the builder
//! hands back, success or not, so the struct never holds a half-applied
//! step.

use crate::config::{ClientAuth, TlsSettings};
use crate::error::{Rejected, Result, TlsSetupError};
use crate::identity::{load_identity, Identity};
use crate::trust::{build_trust_pool_with, NativeRoots, SystemRoots, TrustPool};
use crate::version::{resolve_version_range, VersionRange};
use rustls::client::ResolvesClientCert;
use rustls::crypto::{ring, CryptoProvider};
use rustls::server::{ClientHello, ResolvesServerCert, WebPkiClientVerifier};
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, ServerConfig, SignatureScheme};
use std::path::Path;
use std::sync::Arc;
use tlsetup_common_secret::SecretString;
use tracing::info;

/// TLS inputs for one endpoint, in the form rustls consumes.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    pub trust_pool: TrustPool,
    pub identities: Vec<Identity>,
    pub versions: VersionRange,
    pub client_auth: ClientAuth,
    pub alpn: Vec<Vec<u8>>,
}

/// Hands rustls an already verified identity.
///
/// The key/certificate pairing is checked when the identity is loaded, so
/// the chain is passed through as is.
#[derive(Debug)]
struct IdentityResolver(Arc<CertifiedKey>);

impl ResolvesServerCert for IdentityResolver {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }
}

impl ResolvesClientCert for IdentityResolver {
    fn resolve(
        &self,
        _root_hint_subjects: &[&[u8]],
        _sigschemes: &[SignatureScheme],
    ) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }

    fn has_certs(&self) -> bool {
        true
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(ring::default_provider())
}

fn settle<S: std::fmt::Debug>(slot: &mut S, outcome: std::result::Result<S, Rejected<S>>) -> Result<()> {
    match outcome {
        Ok(state) => {
            *slot = state;
            Ok(())
        }
        Err(rejected) => {
            let (error, state) = rejected.into_parts();
            *slot = state;
            Err(error)
        }
    }
}

impl EndpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the trust pool from the platform store and `ca_file`.
    pub fn install_trust_pool(&mut self, ca_file: Option<&Path>, use_system_ca: bool) -> Result<()> {
        self.install_trust_pool_with(&NativeRoots, ca_file, use_system_ca)
    }

    /// [`Self::install_trust_pool`] with an explicit platform store.
    pub fn install_trust_pool_with(
        &mut self,
        system: &dyn SystemRoots,
        ca_file: Option<&Path>,
        use_system_ca: bool,
    ) -> Result<()> {
        settle(
            &mut self.trust_pool,
            build_trust_pool_with(system, ca_file, use_system_ca),
        )
    }

    /// Load one identity and append it. Nothing is appended on error.
    pub fn install_identity(
        &mut self,
        required: bool,
        cert_file: Option<&Path>,
        key_file: Option<&Path>,
        key_password: Option<&SecretString>,
    ) -> Result<()> {
        if let Some(identity) = load_identity(required, cert_file, key_file, key_password)? {
            self.identities.push(identity);
        }
        Ok(())
    }

    /// Resolve and store the protocol version range.
    pub fn install_versions(&mut self, min_name: &str, max_name: &str) -> Result<()> {
        settle(&mut self.versions, resolve_version_range(min_name, max_name))
    }

    /// Run all builders over `settings`, stopping at the first error.
    pub fn from_settings(settings: &TlsSettings) -> Result<Self> {
        Self::from_settings_with(&NativeRoots, settings)
    }

    /// [`Self::from_settings`] with an explicit platform store.
    pub fn from_settings_with(system: &dyn SystemRoots, settings: &TlsSettings) -> Result<Self> {
        let mut endpoint = Self {
            client_auth: settings.client_auth,
            alpn: settings.alpn_wire(),
            ..Self::default()
        };

        endpoint.install_trust_pool_with(system, settings.ca_file.as_deref(), settings.use_system_ca)?;
        endpoint.install_identity(
            settings.identity_required,
            settings.cert_file.as_deref(),
            settings.key_file.as_deref(),
            settings.key_password.as_ref(),
        )?;
        endpoint.install_versions(&settings.min_version, &settings.max_version)?;

        info!(
            trust_pool = endpoint.trust_pool.len(),
            identities = endpoint.identities.len(),
            min_version = ?endpoint.versions.min,
            max_version = ?endpoint.versions.max,
            "Endpoint configuration built"
        );
        Ok(endpoint)
    }

    /// The identity presented to peers.
    pub fn primary_identity(&self) -> Option<&Identity> {
        self.identities.first()
    }

    /// Server configuration presenting the first identity.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let identity = self
            .primary_identity()
            .ok_or(TlsSetupError::MissingRequiredIdentity)?;
        let versions = self.versions.protocol_versions()?;
        let provider = provider();

        let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(&versions)?;

        let builder = match self.client_auth {
            ClientAuth::None => builder.with_no_client_auth(),
            auth => {
                let roots = Arc::new(self.trust_pool.root_store().clone());
                let mut verifier = WebPkiClientVerifier::builder_with_provider(roots, provider);
                if auth == ClientAuth::Optional {
                    verifier = verifier.allow_unauthenticated();
                }
                let verifier = verifier
                    .build()
                    .map_err(|e| TlsSetupError::Engine(format!("client verifier: {e}")))?;
                builder.with_client_cert_verifier(verifier)
            }
        };

        let mut config = builder.with_cert_resolver(Arc::new(IdentityResolver(identity.certified_key())));
        config.alpn_protocols = self.alpn.clone();
        Ok(config)
    }

    /// Client configuration trusting the pool, presenting the first
    /// identity when there is one.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let versions = self.versions.protocol_versions()?;

        let builder = ClientConfig::builder_with_provider(provider())
            .with_protocol_versions(&versions)?
            .with_root_certificates(self.trust_pool.root_store().clone());

        let mut config = match self.primary_identity() {
            Some(identity) => {
                builder.with_client_cert_resolver(Arc::new(IdentityResolver(identity.certified_key())))
            }
            None => builder.with_no_client_auth(),
        };
        config.alpn_protocols = self.alpn.clone();
        Ok(config)
    }
}
