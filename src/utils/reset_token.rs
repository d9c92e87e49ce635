//! One-time password reset tokens.
//!
//! The raw token goes to the user; only its SHA-256 digest is stored.

use sha2::{Digest, Sha256};

pub fn generate() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
