//! Password key derivation and constant-time verification.
//!
//! PBKDF2-HMAC-SHA256 with a fixed iteration count and output length. The
//! derived hash and the per-user random salt are what gets persisted; the
//! raw password never is.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// PBKDF2 iteration count.
pub const ITERATIONS: u32 = 310_000;

/// Derived hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Per-user salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Generate a fresh random salt.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Derive the password hash for the given salt.
///
/// Deterministic: identical inputs always yield identical output. This is
/// CPU-bound (hundreds of milliseconds); callers on the async path must
/// run it via `tokio::task::spawn_blocking`.
#[must_use]
pub fn derive_hash(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut hash);
    hash
}

/// Verify a submitted password against a stored salt and hash.
///
/// The comparison is constant-time in the hash contents, so verification
/// time does not depend on where the first mismatched byte occurs. A
/// stored hash of the wrong length fails deterministically (length is the
/// only thing that branch reveals).
#[must_use]
pub fn verify(password: &str, salt: &[u8], stored_hash: &[u8]) -> bool {
    let derived = derive_hash(password, salt);

    if stored_hash.len() != HASH_LEN {
        return false;
    }
    derived.ct_eq(stored_hash).into()
}
