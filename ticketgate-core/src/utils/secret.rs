//! Secure secret handling using the secrecy crate with partial masking
//!
//! `MaskedSecret` keeps the ticket signing secret out of logs and `Debug`
//! output while still allowing it to be loaded from configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// A secret string that is zeroized on drop and masked in Debug/Display.
///
/// # Example
/// ```
/// use ticketgate_core::utils::secret::MaskedSecret;
///
/// let secret = MaskedSecret::new("0123456789abcdef-signing".to_string());
///
/// assert_eq!(format!("{:?}", secret), "\"****************-***ning\"");
/// assert_eq!(secret.expose_secret(), "0123456789abcdef-signing");
/// ```
#[derive(Clone)]
pub struct MaskedSecret(SecretString);

impl MaskedSecret {
    pub fn new(value: String) -> Self {
        Self(SecretString::new(value.into_boxed_str()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self::new(s.to_string())
    }

    /// Expose the secret value. Only the ticket codec should need this.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

/// Mask a value with asterisks, keeping a short suffix visible
///
/// - values shorter than 12 chars keep their last 2 chars
/// - longer values keep their last 4 chars
/// - dashes are preserved in place
pub fn mask_value(value: &str) -> String {
    let value_len = value.chars().count();
    let visible_suffix_len = if value_len >= 12 { 4 } else { 2.min(value_len) };
    let prefix_len = value_len.saturating_sub(visible_suffix_len);

    value
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i < prefix_len && c != '-' {
                '*'
            } else {
                c
            }
        })
        .collect()
}

impl std::fmt::Debug for MaskedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", mask_value(self.0.expose_secret()))
    }
}

impl std::fmt::Display for MaskedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", mask_value(self.0.expose_secret()))
    }
}

impl<'de> Deserialize<'de> for MaskedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(MaskedSecret::new(value))
    }
}

impl PartialEq for MaskedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for MaskedSecret {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_secret_debug_shows_partial() {
        let secret = MaskedSecret::new("super-secret-password-123".to_string());
        let debug_output = format!("{:?}", secret);

        assert!(debug_output.contains("***"));
        assert!(debug_output.ends_with("123\""));
        assert!(!debug_output.contains("super-secret-password"));
    }

    #[test]
    fn test_masked_secret_short_value() {
        let secret = MaskedSecret::new("pass".to_string());
        assert_eq!(format!("{}", secret), "**ss");
    }

    #[test]
    fn test_masked_secret_expose_gives_full_value() {
        let secret = MaskedSecret::from_str("my-secret");
        assert_eq!(secret.expose_secret(), "my-secret");
        assert_eq!(secret.len(), 9);
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_masked_secret_deserialization() {
        let secret: MaskedSecret = serde_norway::from_str("my-password").unwrap();
        assert_eq!(secret.expose_secret(), "my-password");
    }
}
