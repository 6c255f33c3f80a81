//! Cryptographic Utilities
//!
//! Used to verify shared-secret tokens without storing them in clear.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check a presented token against the stored SHA-256 digest of the secret
pub fn verify_token(presented: &str, expected_digest: &[u8; 32]) -> bool {
    constant_time_eq(&sha256(presented.as_bytes()), expected_digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_verify_token() {
        let digest = sha256(b"let-me-in");
        assert!(verify_token("let-me-in", &digest));
        assert!(!verify_token("let-me-out", &digest));
        assert!(!verify_token("", &digest));
    }
}
