use sha2::{Digest, Sha256};

pub const PIN_LENGTH: usize = 4;

/// Hex encoded SHA-256 of the PIN. Unsalted, so equal PINs share a digest.
pub fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_pin(pin: &str, digest: &str) -> bool {
    hash_pin(pin) == digest
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}
