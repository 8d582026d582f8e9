//! Protocol version range resolution.

use crate::error::{Rejected, TlsSetupError};
use rustls::SupportedProtocolVersion;
use std::fmt;
use tracing::info;

/// TLS protocol version.
///
/// Variants are declared oldest first, so the derived ordering is the
/// protocol ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

/// Recognised version names, keyed by their uppercase spelling.
static VERSION_NAMES: &[(&str, TlsVersion)] = &[
    ("TLS10", TlsVersion::Tls10),
    ("TLS11", TlsVersion::Tls11),
    ("TLS12", TlsVersion::Tls12),
    ("TLS13", TlsVersion::Tls13),
];

/// Minimum version used when none is configured.
pub const DEFAULT_MIN_VERSION: TlsVersion = TlsVersion::Tls11;

/// Maximum version used when none is configured.
pub const DEFAULT_MAX_VERSION: TlsVersion = TlsVersion::Tls12;

impl TlsVersion {
    /// Case-insensitive lookup of a version name such as `"tls12"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.to_ascii_uppercase();
        VERSION_NAMES
            .iter()
            .find(|(known, _)| *known == key)
            .map(|(_, version)| *version)
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tls10 => "TLS10",
            Self::Tls11 => "TLS11",
            Self::Tls12 => "TLS12",
            Self::Tls13 => "TLS13",
        }
    }

    /// IANA protocol version identifier.
    pub fn code(self) -> u16 {
        match self {
            Self::Tls10 => 0x0301,
            Self::Tls11 => 0x0302,
            Self::Tls12 => 0x0303,
            Self::Tls13 => 0x0304,
        }
    }

    /// The rustls counterpart, if rustls can negotiate this version.
    pub fn supported(self) -> Option<&'static SupportedProtocolVersion> {
        match self {
            Self::Tls12 => Some(&rustls::version::TLS12),
            Self::Tls13 => Some(&rustls::version::TLS13),
            Self::Tls10 | Self::Tls11 => None,
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Negotiable protocol version range. `None` means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<TlsVersion>,
    pub max: Option<TlsVersion>,
}

impl VersionRange {
    /// The range used when nothing is configured.
    pub fn defaults() -> Self {
        Self {
            min: Some(DEFAULT_MIN_VERSION),
            max: Some(DEFAULT_MAX_VERSION),
        }
    }

    /// Minimum as a wire identifier, 0 when unset.
    pub fn min_code(&self) -> u16 {
        self.min.map_or(0, TlsVersion::code)
    }

    /// Maximum as a wire identifier, 0 when unset.
    pub fn max_code(&self) -> u16 {
        self.max.map_or(0, TlsVersion::code)
    }

    /// Versions inside the range that rustls can negotiate, newest first.
    ///
    /// Fails when either bound is unset or nothing in the range is
    /// negotiable (e.g. `TLS10..=TLS11`).
    pub fn protocol_versions(&self) -> Result<Vec<&'static SupportedProtocolVersion>, TlsSetupError> {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return Err(TlsSetupError::NoSupportedVersion {
                min: display_bound(self.min),
                max: display_bound(self.max),
            });
        };

        let versions: Vec<_> = VERSION_NAMES
            .iter()
            .rev()
            .map(|(_, version)| *version)
            .filter(|version| (min..=max).contains(version))
            .filter_map(TlsVersion::supported)
            .collect();

        if versions.is_empty() {
            return Err(TlsSetupError::NoSupportedVersion {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(versions)
    }
}

fn display_bound(bound: Option<TlsVersion>) -> String {
    bound.map_or_else(|| "unset".to_string(), |v| v.to_string())
}

fn resolve_name(name: &str, default: TlsVersion) -> Result<TlsVersion, TlsSetupError> {
    if name.is_empty() {
        return Ok(default);
    }
    TlsVersion::from_name(name).ok_or_else(|| TlsSetupError::UnrecognizedVersionName(name.to_string()))
}

/// Resolve a `(min, max)` pair of version names.
///
/// Empty names take the defaults. On failure the rejected state keeps a
/// successfully resolved minimum and always leaves the maximum unset.
pub fn resolve_version_range(
    min_name: &str,
    max_name: &str,
) -> Result<VersionRange, Rejected<VersionRange>> {
    let min = resolve_name(min_name, DEFAULT_MIN_VERSION)
        .map_err(|e| Rejected::new(e, VersionRange::default()))?;
    let partial = VersionRange {
        min: Some(min),
        max: None,
    };

    let max = resolve_name(max_name, DEFAULT_MAX_VERSION).map_err(|e| Rejected::new(e, partial))?;
    if min > max {
        let error = TlsSetupError::VersionRangeOrder {
            min: min.to_string(),
            max: max.to_string(),
        };
        return Err(Rejected::new(error, partial));
    }

    info!(min = %min, max = %max, "Resolved TLS version range");
    Ok(VersionRange {
        min: Some(min),
        max: Some(max),
    })
}
