//! Secret generation and hashing.
//!
//! Randomness comes from an [`EntropySource`] injected at construction time.
//! Secrets are stored as SHA-256 hex digests and compared in constant time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub use vouch_core::{EntropySource, OsEntropy, SeededEntropy};

/// Smallest allowed numeric code length.
pub const MIN_CODE_LENGTH: usize = 4;

/// Largest allowed numeric code length.
pub const MAX_CODE_LENGTH: usize = 12;

/// Default number of random bytes in a link token (256 bits).
pub const DEFAULT_LINK_TOKEN_BYTES: usize = 32;

/// How a channel's secrets look and how they are produced.
pub trait SecretStrategy: Send + Sync {
    /// Produce a fresh secret.
    fn generate(&self, entropy: &dyn EntropySource) -> String;

    /// Cheap shape check on presented input. Malformed input is still hashed
    /// and compared so the verifier does no extra work on the happy path.
    fn is_well_formed(&self, presented: &str) -> bool;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

/// Zero-padded decimal code of a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericCode {
    length: usize,
}

impl NumericCode {
    /// Build a numeric strategy. The length is clamped to 4..=12.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
        }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for NumericCode {
    fn default() -> Self {
        Self::new(6)
    }
}

impl SecretStrategy for NumericCode {
    fn generate(&self, entropy: &dyn EntropySource) -> String {
        let mut code = String::with_capacity(self.length);
        let mut buf = [0u8; 16];
        while code.len() < self.length {
            entropy.fill_bytes(&mut buf);
            for byte in buf {
                // 250 is the largest multiple of 10 below 256; higher bytes bias low digits.
                if byte >= 250 {
                    continue;
                }
                code.push(char::from(b'0' + byte % 10));
                if code.len() == self.length {
                    break;
                }
            }
        }
        code
    }

    fn is_well_formed(&self, presented: &str) -> bool {
        presented.len() == self.length && presented.bytes().all(|b| b.is_ascii_digit())
    }

    fn name(&self) -> &'static str {
        "numeric"
    }
}

/// URL-safe random token for link channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkToken {
    bytes: usize,
}

impl LinkToken {
    #[must_use]
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes: bytes.max(16),
        }
    }

    fn encoded_len(&self) -> usize {
        (self.bytes * 4).div_ceil(3)
    }
}

impl Default for LinkToken {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TOKEN_BYTES)
    }
}

impl SecretStrategy for LinkToken {
    fn generate(&self, entropy: &dyn EntropySource) -> String {
        let mut raw = vec![0u8; self.bytes];
        entropy.fill_bytes(&mut raw);
        URL_SAFE_NO_PAD.encode(raw)
    }

    fn is_well_formed(&self, presented: &str) -> bool {
        presented.len() == self.encoded_len()
            && presented
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    fn name(&self) -> &'static str {
        "link_token"
    }
}

/// Hash a secret for storage using SHA-256.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a presented secret against a stored digest in constant time.
#[must_use]
pub fn verify_secret(presented: &str, stored_hash: &str) -> bool {
    let presented_hash = hash_secret(presented);
    presented_hash
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

/// Random bytes rendered as base64url, for bearer tokens and throwaway credentials.
#[must_use]
pub fn random_token(entropy: &dyn EntropySource, bytes: usize) -> String {
    let mut raw = vec![0u8; bytes];
    entropy.fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Emits a fixed byte pattern, cycling.
    struct PatternEntropy(Vec<u8>, Mutex<usize>);

    impl EntropySource for PatternEntropy {
        fn fill_bytes(&self, dest: &mut [u8]) {
            let mut pos = self.1.lock();
            for byte in dest.iter_mut() {
                *byte = self.0[*pos % self.0.len()];
                *pos += 1;
            }
        }
    }

    #[test]
    fn test_numeric_code_shape() {
        let entropy = OsEntropy;
        for length in [4, 6, 8, 12] {
            let strategy = NumericCode::new(length);
            for _ in 0..50 {
                let code = strategy.generate(&entropy);
                assert_eq!(code.len(), length);
                assert!(code.bytes().all(|b| b.is_ascii_digit()));
                assert!(strategy.is_well_formed(&code));
            }
        }
    }

    #[test]
    fn test_numeric_code_length_clamped() {
        assert_eq!(NumericCode::new(1).length(), 4);
        assert_eq!(NumericCode::new(40).length(), 12);
    }

    #[test]
    fn test_numeric_code_keeps_leading_zeros() {
        let entropy = PatternEntropy(vec![0, 10, 20, 1], Mutex::new(0));
        let code = NumericCode::new(6).generate(&entropy);
        assert_eq!(code, "000100");
    }

    #[test]
    fn test_numeric_code_rejects_biased_bytes() {
        let entropy = PatternEntropy(vec![255, 250, 7], Mutex::new(0));
        let code = NumericCode::new(4).generate(&entropy);
        assert_eq!(code, "7777");
    }

    #[test]
    fn test_numeric_well_formed() {
        let strategy = NumericCode::new(6);
        assert!(strategy.is_well_formed("012345"));
        assert!(!strategy.is_well_formed("01234"));
        assert!(!strategy.is_well_formed("01234a"));
    }

    #[test]
    fn test_link_token_shape() {
        let strategy = LinkToken::default();
        let token = strategy.generate(&OsEntropy);
        assert_eq!(token.len(), 43);
        assert!(strategy.is_well_formed(&token));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_link_tokens_unique() {
        let strategy = LinkToken::default();
        let tokens: HashSet<String> = (0..100).map(|_| strategy.generate(&OsEntropy)).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_seeded_entropy_is_deterministic() {
        let a = NumericCode::new(8).generate(&SeededEntropy::new(7));
        let b = NumericCode::new(8).generate(&SeededEntropy::new(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("123456");
        assert_eq!(hash.len(), 64);
        assert!(verify_secret("123456", &hash));
        assert!(!verify_secret("123457", &hash));
        assert!(!verify_secret("", &hash));
    }
}
