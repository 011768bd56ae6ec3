use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::Error;

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

/// Fills a buffer straight from the operating system CSPRNG.
///
/// There is deliberately no fallback generator: if the OS source fails the
/// caller gets [`Error::Entropy`] and the sign-in attempt is aborted.
fn random_bytes<const N: usize>() -> Result<[u8; N], Error> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// Generates a cryptographically random code verifier for PKCE.
///
/// Returns a 43-character URL-safe string (32 random bytes, RFC 7636 compliant).
///
/// # Errors
///
/// Returns [`Error::Entropy`] if the OS random source is unavailable.
pub fn generate_code_verifier() -> Result<String, Error> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<VERIFIER_BYTES>()?))
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
#[must_use]
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates a random anti-forgery state token.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
///
/// # Errors
///
/// Returns [`Error::Entropy`] if the OS random source is unavailable.
pub fn generate_state() -> Result<String, Error> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<STATE_BYTES>()?))
}

/// Verifier, challenge and state for one authorization attempt.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl PkcePair {
    /// Generate fresh PKCE material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the OS random source is unavailable.
    pub fn generate() -> Result<Self, Error> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = compute_code_challenge(&code_verifier);
        Ok(Self {
            code_verifier,
            code_challenge,
            state: generate_state()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_verifier_length() {
        let verifier = generate_code_verifier().unwrap();
        assert_eq!(verifier.len(), 43);
    }

    #[test]
    fn test_code_verifier_url_safe() {
        let verifier = generate_code_verifier().unwrap();
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "verifier should be URL-safe: {}",
            verifier
        );
    }

    #[test]
    fn test_code_verifier_uniqueness() {
        let v1 = generate_code_verifier().unwrap();
        let v2 = generate_code_verifier().unwrap();
        assert_ne!(v1, v2, "verifiers should be unique");
    }

    #[test]
    fn test_code_challenge_deterministic() {
        let verifier = "test_verifier_string";
        let c1 = compute_code_challenge(verifier);
        let c2 = compute_code_challenge(verifier);
        assert_eq!(c1, c2, "challenge should be deterministic");
    }

    #[test]
    fn test_code_challenge_fixed_point() {
        // SHA-256("abc123") = 6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090
        assert_eq!(
            compute_code_challenge("abc123"),
            "bKE9UspwyIPg8LsQHkJaiehiTeUdstI5JZOvaoQRgJA"
        );
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        assert_eq!(
            compute_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_code_challenge_different_for_different_verifiers() {
        let c1 = compute_code_challenge("verifier_1");
        let c2 = compute_code_challenge("verifier_2");
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_state_length() {
        let state = generate_state().unwrap();
        assert_eq!(state.len(), 22);
    }

    #[test]
    fn test_state_uniqueness() {
        let s1 = generate_state().unwrap();
        let s2 = generate_state().unwrap();
        assert_ne!(s1, s2, "states should be unique");
    }

    #[test]
    fn test_pair_challenge_matches_verifier() {
        let pair = PkcePair::generate().unwrap();
        assert_eq!(pair.code_challenge, compute_code_challenge(&pair.code_verifier));
    }
}
