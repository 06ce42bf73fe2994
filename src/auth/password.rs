// src/auth/password.rs
//
// Stored form: pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::auth::token::constant_time_eq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_BYTES: usize = 16;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Hash with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let iterations = iterations.max(1);
    let key = derive_key(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        B64.encode(salt),
        B64.encode(key)
    )
}

/// `false` for a wrong password and for any malformed stored value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (B64.decode(salt), B64.decode(hash)) else {
        return false;
    };
    if iterations == 0 || password.is_empty() {
        return false;
    }

    let key = derive_key(password, &salt, iterations);
    constant_time_eq(&key, &expected)
}
