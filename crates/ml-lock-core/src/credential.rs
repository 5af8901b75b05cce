//! Credential derivation and verification
//!
//! Secrets are stretched with PBKDF2-HMAC-SHA256 using a fixed salt and
//! work factor, so digests written by older installations stay valid.
//! Digest comparison is constant-time.

use std::fmt;

use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Salt shared by every installation
pub const SALT: &[u8] = b"ml_lock_salt";
/// PBKDF2 iteration count
pub const ITERATIONS: u32 = 100_000;
/// Length of a reference digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Errors decoding a stored digest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("digest is not valid hex: {0}")]
    InvalidHex(String),

    #[error("digest must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Reference digest a candidate secret is checked against
///
/// Immutable once constructed. `Debug` never prints the digest.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialReference {
    digest: [u8; DIGEST_LEN],
}

impl CredentialReference {
    /// Derive the reference for a secret
    pub fn derive(secret: &str) -> Self {
        Self {
            digest: *derive_digest(secret),
        }
    }

    /// Decode a hex-encoded reference digest
    pub fn from_hex(encoded: &str) -> Result<Self, DigestError> {
        let bytes =
            hex::decode(encoded.trim()).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        let digest: [u8; DIGEST_LEN] =
            bytes.try_into().map_err(|_| DigestError::InvalidLength {
                expected: DIGEST_LEN,
                actual,
            })?;
        Ok(Self { digest })
    }

    /// Hex encoding as persisted in the credential store
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Constant-time comparison against a freshly derived digest
    fn matches(&self, candidate: &[u8; DIGEST_LEN]) -> bool {
        bool::from(self.digest[..].ct_eq(&candidate[..]))
    }
}

impl fmt::Debug for CredentialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialReference")
            .field("digest", &"<redacted>")
            .finish()
    }
}

/// Derive the digest for a secret
pub fn derive_digest(secret: &str) -> Zeroizing<[u8; DIGEST_LEN]> {
    let mut out = Zeroizing::new([0u8; DIGEST_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), SALT, ITERATIONS, &mut out[..]);
    out
}

/// Decides whether a candidate secret matches
pub trait Verifier {
    /// Returns true iff the candidate derives to the reference digest
    fn verify(&self, candidate: &str) -> bool;
}

/// Verifier backed by a loaded [`CredentialReference`]
///
/// A verifier can only be built from a reference, so a session can
/// never start without one.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    reference: CredentialReference,
}

impl CredentialVerifier {
    pub fn new(reference: CredentialReference) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &CredentialReference {
        &self.reference
    }
}

impl Verifier for CredentialVerifier {
    fn verify(&self, candidate: &str) -> bool {
        let digest = derive_digest(candidate);
        self.reference.matches(&digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Digest of "123" as written by existing installations
    const DIGEST_123: &str = "a936d8e24f7b6ad0540a3af4addb375d92c8931236ded941aba14c8db9a4d3cf";

    #[test]
    fn test_derive_matches_existing_stores() {
        assert_eq!(CredentialReference::derive("123").to_hex(), DIGEST_123);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let verifier = CredentialVerifier::new(CredentialReference::from_hex(DIGEST_123).unwrap());
        assert!(verifier.verify("123"));
        assert!(!verifier.verify("124"));
        assert!(!verifier.verify(""));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            CredentialReference::from_hex("zz"),
            Err(DigestError::InvalidHex(_))
        ));
        assert_eq!(
            CredentialReference::from_hex("abcd"),
            Err(DigestError::InvalidLength {
                expected: DIGEST_LEN,
                actual: 2
            })
        );
    }

    #[test]
    fn test_from_hex_trims_whitespace() {
        let padded = format!("  {}\n", DIGEST_123);
        let reference = CredentialReference::from_hex(&padded).unwrap();
        assert_eq!(reference.to_hex(), DIGEST_123);
    }

    #[test]
    fn test_debug_is_redacted() {
        let reference = CredentialReference::from_hex(DIGEST_123).unwrap();
        let printed = format!("{:?}", reference);
        assert!(!printed.contains(DIGEST_123));
        assert!(printed.contains("redacted"));
    }
}
