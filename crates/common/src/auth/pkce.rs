//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 with the `S256` method. Verifiers and states are drawn
//! uniformly from the 62 ASCII alphanumerics using the operating system's
//! CSPRNG; if that source fails, generation fails instead of degrading.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Characters allowed in verifiers and states
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default verifier length
pub const VERIFIER_LENGTH: usize = 64;

/// Default state length
pub const STATE_LENGTH: usize = 16;

// Largest multiple of 62 that fits in a byte; bytes at or above it are
// rejected so every character is equally likely.
const REJECTION_BOUND: u8 = 248;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PkceError {
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),
}

/// Generate a random alphanumeric string of exactly `length` characters.
///
/// # Errors
/// Returns [`PkceError::RandomnessUnavailable`] if the OS random source fails.
pub fn generate_verifier(length: usize) -> Result<String, PkceError> {
    let mut output = String::with_capacity(length);
    let mut buffer = vec![0u8; length.max(16) * 2];

    while output.len() < length {
        OsRng
            .try_fill_bytes(&mut buffer)
            .map_err(|err| PkceError::RandomnessUnavailable(err.to_string()))?;

        for byte in buffer.iter().copied().filter(|byte| *byte < REJECTION_BOUND) {
            if output.len() == length {
                break;
            }
            output.push(char::from(ALPHABET[usize::from(byte % 62)]));
        }
    }

    Ok(output)
}

/// Compute `BASE64URL(SHA256(verifier))` without padding
pub fn derive_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a state token correlating a callback with its login attempt.
///
/// # Errors
/// Returns [`PkceError::RandomnessUnavailable`] if the OS random source fails.
pub fn generate_state() -> Result<String, PkceError> {
    generate_verifier(STATE_LENGTH)
}

/// Verifier, challenge and state for one login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceSession {
    /// Kept secret until token exchange
    pub code_verifier: String,

    /// SHA256 of `code_verifier`, sent with the authorization request
    pub code_challenge: String,

    /// Must come back unchanged on the callback
    pub state: String,
}

impl PkceSession {
    /// Generate a session with a 64 character verifier and 16 character state
    ///
    /// # Examples
    /// ```
    /// use moodmix_common::auth::pkce::{derive_challenge, PkceSession};
    ///
    /// let session = PkceSession::generate().expect("secure randomness");
    /// assert_eq!(session.code_verifier.len(), 64);
    /// assert_eq!(session.code_challenge, derive_challenge(&session.code_verifier));
    /// ```
    ///
    /// # Errors
    /// Returns [`PkceError::RandomnessUnavailable`] if the OS random source
    /// fails.
    pub fn generate() -> Result<Self, PkceError> {
        Self::with_lengths(VERIFIER_LENGTH, STATE_LENGTH)
    }

    /// Generate a session with custom verifier/state lengths
    ///
    /// # Errors
    /// Returns [`PkceError::RandomnessUnavailable`] if the OS random source
    /// fails.
    pub fn with_lengths(verifier_length: usize, state_length: usize) -> Result<Self, PkceError> {
        let code_verifier = generate_verifier(verifier_length)?;
        let code_challenge = derive_challenge(&code_verifier);
        let state = generate_verifier(state_length)?;

        Ok(Self { code_verifier, code_challenge, state })
    }

    /// Get the challenge method (always "S256")
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }
}
