//! Redacted secret values.
//!
//! Private-key passwords travel from the settings layer into the key
//! decoder. They must never show up in logs, debug dumps or re-serialized
//! settings, and their memory is wiped when the value is dropped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A value that is redacted in logs and debug output.
///
/// # Example
///
/// ```rust
/// use tlsetup_common_secret::SecretString;
///
/// let password = SecretString::from("hunter2");
/// assert_eq!(format!("{}", password), "[REDACTED]");
/// assert_eq!(format!("{:?}", password), "Secret([REDACTED])");
/// assert_eq!(password.expose(), "hunter2");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    ///
    /// Call sites should hand the value straight to the consumer that needs
    /// it and never format it.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

/// Password-style secret.
pub type SecretString = Secret<String>;

impl Secret<String> {
    /// True when no password was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Password bytes as fed to a key-derivation function.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl<T: Zeroize + Default> Default for Secret<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret::new)
    }
}

// Serialized settings never carry the real value.
impl<T: Zeroize + Serialize> Serialize for Secret<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        "[REDACTED]".serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_debug_are_redacted() {
        let secret = SecretString::from("test");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
    }

    #[test]
    fn test_expose_returns_value() {
        let secret = SecretString::from("test");
        assert_eq!(secret.expose(), "test");
        assert_eq!(secret.as_bytes(), b"test");
    }

    #[test]
    fn test_empty_password() {
        assert!(SecretString::default().is_empty());
        assert!(SecretString::from("").is_empty());
        assert!(!SecretString::from("x").is_empty());
    }

    #[test]
    fn test_serialization_is_redacted() {
        let secret = SecretString::from("test");
        let serialized = serde_json::to_string(&secret).unwrap();
        assert_eq!(serialized, "\"[REDACTED]\"");
    }

    #[test]
    fn test_deserialization_keeps_value() {
        let secret: SecretString = serde_json::from_str("\"s3cret\"").unwrap();
        assert_eq!(secret.expose(), "s3cret");
    }

    #[test]
    fn test_equality() {
        assert_eq!(SecretString::from("a"), SecretString::from("a"));
        assert_ne!(SecretString::from("a"), SecretString::from("b"));
    }
}
