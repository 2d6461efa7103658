//! Opaque token generation and shape validation
//!
//! State tokens and session exchange handles are 256 bits of
//! cryptographically secure randomness, base64url-encoded without padding
//! (43 characters at the default 32 bytes). `ThreadRng` reseeds from the
//! operating system and is a CSPRNG, which is a hard requirement here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Generate a fresh opaque token of `n_bytes` random bytes,
/// base64url-encoded without padding.
#[must_use]
pub fn generate(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Length of the base64url-no-pad encoding of `n_bytes` bytes.
#[must_use]
pub const fn encoded_len(n_bytes: usize) -> usize {
    (4 * n_bytes + 2) / 3
}

/// Cheap shape check for a candidate token, performed before any store
/// round-trip: expected encoded length and base64url alphabet only.
///
/// Rejecting malformed input here costs nothing and keeps garbage out of
/// store keys; it is not a validity check.
#[must_use]
pub fn is_well_formed(candidate: &str, n_bytes: usize) -> bool {
    candidate.len() == encoded_len(n_bytes)
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_has_expected_length() {
        // 32 bytes = 43 base64url chars without padding
        assert_eq!(generate(32).len(), 43);
        assert_eq!(encoded_len(32), 43);
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = generate(32);
        let b = generate(32);
        assert_ne!(a, b);
    }

    #[test]
    fn generated_token_is_well_formed() {
        assert!(is_well_formed(&generate(32), 32));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_well_formed("short", 32));
        assert!(!is_well_formed(&generate(16), 32));
    }

    #[test]
    fn rejects_non_alphabet_bytes() {
        let mut candidate = generate(32);
        candidate.replace_range(0..1, "!");
        assert!(!is_well_formed(&candidate, 32));

        // '=' padding is not part of the no-pad encoding
        let padded = format!("{}=", &generate(32)[..42]);
        assert!(!is_well_formed(&padded, 32));
    }
}
