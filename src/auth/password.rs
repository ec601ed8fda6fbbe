use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Hashes a password with a fresh random salt, stored as
/// `salt_hex:digest_hex`. The salt keeps identical passwords from
/// producing identical rows.
pub fn hash_password(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = hex_encode(&salt_bytes);
    let digest = digest_hex(password, &salt);
    format!("{salt}:{digest}")
}

/// Constant-shape verification against a stored `salt:digest` pair.
/// Malformed stored values verify as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Some((salt, digest)) = stored_hash.split_once(':') else {
        return false;
    };
    digest_hex(password, salt) == digest
}

fn digest_hex(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
