// File: hash.rs
//
// The purpose of this file is to hash a given key with SHA-256,
// truncated to the process-wide ring width M, and to determine whether
// a given key lies within a range on the ring.

use crate::error::ConfigError;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

/// A position on the Chord ring, in `[0, 2^bits)`.
pub type Key = u64;

/// Validates that `bits` is a multiple of 8 and fits in a `Key`.
pub fn check_bits(bits: u32) -> Result<(), ConfigError> {
    if bits == 0 || bits > 64 || bits % 8 != 0 {
        return Err(ConfigError::UnsupportedBits(bits));
    }
    Ok(())
}

/// Hashes `value` with SHA-256 and truncates the digest to its leading
/// `bits / 8` big-endian bytes, interpreted as an unsigned integer in
/// `[0, 2^bits)`.
pub fn hash(bits: u32, value: &str) -> Key {
    debug_assert!(check_bits(bits).is_ok(), "invalid ring width {}", bits);

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();

    let num_bytes = (bits / 8) as usize;
    let mut acc: u128 = 0;
    for byte in &digest[..num_bytes] {
        acc = (acc << 8) | (*byte as u128);
    }
    acc as Key
}

/// The ring's key space size, `2^bits`, as a u128 so it is representable
/// even when `bits == 64`.
pub fn modulus(bits: u32) -> u128 {
    1u128 << bits
}

/// Returns whether `id` lies in the clockwise arc from `min` to `max`.
/// `incl` controls whether `max` itself counts as being "in range".
/// When `min == max` the arc is the whole ring, so every id qualifies.
pub fn in_range(id: Key, min: Key, max: Key, incl: bool) -> bool {
    match min.cmp(&max) {
        Ordering::Less => {
            if incl {
                id > min && id <= max
            } else {
                id > min && id < max
            }
        }
        Ordering::Greater => {
            if incl {
                id > min || id <= max
            } else {
                id > min || id < max
            }
        }
        Ordering::Equal => true,
    }
}
