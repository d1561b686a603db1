//! Identifier generation on top of random (v4) UUIDs.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase base-36 id of `len` characters drawn from v4 UUIDs.
///
/// Each UUID contributes at most 20 digits, below its 122 random bits.
pub(crate) fn base36_id(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        let mut bits = Uuid::new_v4().as_u128();
        for _ in 0..20 {
            if out.len() == len {
                break;
            }
            out.push(ALPHABET[(bits % 36) as usize] as char);
            bits /= 36;
        }
    }
    out
}

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_millis(at: SystemTime) -> u128 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
