//! The one-shot PIN credential primitive.
//!
//! A sender displays a 4-digit PIN once; the receiver proves knowledge of it
//! by transmitting the BLAKE2b-256 digest of the decimal text as lowercase
//! hex. Digests are compared in constant time on both ends. The PIN never
//! keys a cipher; it only gates the session.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

type Blake2b256 = Blake2b<U32>;

/// Smallest PIN ever generated.
pub const PIN_MIN: u16 = 1000;
/// Largest PIN ever generated.
pub const PIN_MAX: u16 = 9999;
/// Length of the hex digest sent on the wire.
pub const PIN_DIGEST_LEN: usize = 64;

/// Draws a uniformly random PIN in `[1000, 9999]` from the OS CSPRNG.
#[must_use]
pub fn generate_pin() -> u16 {
    OsRng.gen_range(PIN_MIN..=PIN_MAX)
}

/// Computes the lowercase-hex BLAKE2b-256 digest of the decimal PIN text.
#[must_use]
pub fn hash_pin(pin: u16) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(pin.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of two digest strings.
#[must_use]
pub fn verify_digest(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Reports whether `pin` hashes to `expected_hex`, in constant time.
#[must_use]
pub fn verify_pin(pin: u16, expected_hex: &str) -> bool {
    verify_digest(&hash_pin(pin), expected_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pins_stay_in_range() {
        for _ in 0..256 {
            let pin = generate_pin();
            assert!((PIN_MIN..=PIN_MAX).contains(&pin));
        }
    }

    #[test]
    fn digest_is_deterministic_lowercase_hex() {
        let digest = hash_pin(1234);
        assert_eq!(digest.len(), PIN_DIGEST_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, hash_pin(1234));
    }

    #[test]
    fn distinct_pins_produce_distinct_digests() {
        assert_ne!(hash_pin(1234), hash_pin(1235));
        assert_ne!(hash_pin(1000), hash_pin(9999));
    }

    #[test]
    fn verification_accepts_the_matching_pin_only() {
        let expected = hash_pin(4321);
        assert!(verify_pin(4321, &expected));
        assert!(!verify_pin(4322, &expected));
        assert!(!verify_pin(4321, ""));
    }
}
