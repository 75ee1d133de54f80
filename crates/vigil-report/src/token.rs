//! Access token issuance.
//!
//! Tokens are opaque random strings handed out once. Only a one-way hash is
//! stored, so a lost token cannot be recovered, only re-issued.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in a token.
pub const TOKEN_BYTES: usize = 32;

/// Issues unguessable tokens and hashes them deterministically.
pub trait TokenIssuer: Send + Sync {
    /// A fresh token.
    fn issue(&self) -> String;

    /// Stable one-way hash used as the lookup key.
    fn hash(&self, token: &str) -> String;
}

/// 32 random bytes from the OS, hex encoded; SHA-256 hex hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenIssuer;

impl TokenIssuer for RandomTokenIssuer {
    fn issue(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn hash(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Loggable form of a token: first and last four characters.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
