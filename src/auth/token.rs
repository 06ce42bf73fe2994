// src/auth/token.rs
//
// Session tokens are 32 random bytes, base64url without padding. The client
// keeps the raw text; storage only ever sees the SHA-256 digest.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

pub const TOKEN_BYTES: usize = 32;

pub type TokenHash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub raw: String,
    pub hash: TokenHash,
}

pub fn issue_token() -> IssuedToken {
    issue_token_with(&mut OsRng)
}

pub fn issue_token_with<R: RngCore + CryptoRng>(rng: &mut R) -> IssuedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let hash = token_hash(&raw);
    IssuedToken { raw, hash }
}

pub fn token_hash(raw: &str) -> TokenHash {
    let digest = Sha256::digest(raw.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Byte comparison that does not stop at the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
