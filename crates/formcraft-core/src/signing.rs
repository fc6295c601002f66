//! Tamper detection for durable storage entries.
//!
//! A signed entry is `"<signature>.<value>"`, where the signature is the
//! URL-safe base64 HMAC-SHA256 of the value under a key derived from the
//! secret and a purpose string. Signing with a purpose keeps a signature made
//! for one kind of entry from verifying as another.
//!
//! Fallback keys are tried after the primary key, so the secret can be
//! rotated without discarding stored values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::FormcraftError;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_PURPOSE: &str = "formcraft.storage";

/// Signs and verifies strings using HMAC-SHA256.
///
/// # Examples
///
/// ```
/// use formcraft_core::signing::Signer;
///
/// let signer = Signer::new("my-secret-key");
/// let signed = signer.sign("hello");
/// assert_eq!(signer.unsign(&signed).unwrap(), "hello");
/// ```
#[derive(Clone)]
pub struct Signer {
    keys: Vec<String>,
    purpose: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("keys", &self.keys.len())
            .field("purpose", &self.purpose)
            .finish()
    }
}

impl Signer {
    /// Creates a signer for the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            keys: vec![secret.into()],
            purpose: DEFAULT_PURPOSE.to_string(),
        }
    }

    /// Adds older secrets accepted during verification.
    #[must_use]
    pub fn with_fallback_keys(mut self, keys: Vec<String>) -> Self {
        self.keys.truncate(1);
        self.keys.extend(keys);
        self
    }

    /// Scopes signatures to a purpose.
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    fn mac(&self, secret: &str) -> HmacSha256 {
        let derived = format!("{}/{secret}", self.purpose);
        HmacSha256::new_from_slice(derived.as_bytes()).expect("HMAC takes keys of any length")
    }

    /// Returns `"<signature>.<value>"`.
    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac(&self.keys[0]);
        mac.update(value.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{tag}.{value}")
    }

    /// Verifies a signed string and returns the value.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::BadSignature`] if the entry is not in signed
    /// form or no key verifies it.
    pub fn unsign(&self, signed: &str) -> Result<String, FormcraftError> {
        let (tag, value) = signed
            .split_once('.')
            .ok_or_else(|| FormcraftError::BadSignature("entry is not signed".to_string()))?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| FormcraftError::BadSignature("malformed signature".to_string()))?;

        let valid = self.keys.iter().any(|secret| {
            let mut mac = self.mac(secret);
            mac.update(value.as_bytes());
            mac.verify_slice(&tag).is_ok()
        });
        if valid {
            Ok(value.to_string())
        } else {
            Err(FormcraftError::BadSignature("signature mismatch".to_string()))
        }
    }
}
