//! XOR stream cipher over a chaos-derived keystream.
//!
//! The key must be at least as long as the message and must not be reused
//! across unrelated messages. Neither property is checked here.

use crate::chaos::{generate_keystream, ChaosParams};

/// Mask `message` with `key`, byte for byte.
/// Output length is the shorter of the two inputs.
pub fn encrypt(message: &[u8], key: &[u8]) -> Vec<u8> {
    message.iter().zip(key).map(|(m, k)| m ^ k).collect()
}

/// Inverse of [`encrypt`]; XOR is its own inverse
pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> Vec<u8> {
    encrypt(ciphertext, key)
}

/// Derive a fresh key sized for `message_len` bytes
pub fn derive_key(params: &ChaosParams, message_len: usize) -> Vec<u8> {
    generate_keystream(params, message_len)
}
