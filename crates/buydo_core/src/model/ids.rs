//! Identifier and token generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a fresh collection-unique entity id.
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// Renders `value` in lowercase base36.
pub fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Base36 of the epoch milliseconds of `at`; pre-epoch instants render as `0`.
pub fn base36_millis(at: DateTime<Utc>) -> String {
    to_base36(u128::try_from(at.timestamp_millis()).unwrap_or(0))
}

/// Random lowercase base36 token of at most `len` characters.
pub fn random_base36(len: usize) -> String {
    let token = to_base36(Uuid::new_v4().as_u128());
    token.chars().take(len).collect()
}
