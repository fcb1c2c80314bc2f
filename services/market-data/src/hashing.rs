//! Identity hashing
//!
//! One-way anonymization for uploader, character, retainer and listing
//! ids, and for API keys before lookup. SHA-256, unkeyed, lowercase hex.
//! Absent or non-string inputs hash as the empty string.

use sha2::{Digest, Sha256};
use types::ids::HashedId;

/// Length of every digest, in hex characters.
pub const DIGEST_LEN: usize = 64;

/// Hash a raw identifier.
pub fn hash(value: &str) -> HashedId {
    let digest = Sha256::digest(value.as_bytes());
    HashedId::from_digest(hex::encode(digest))
}

/// Hash an identifier that may be missing from the upload.
pub fn hash_opt(value: Option<&str>) -> HashedId {
    hash(value.unwrap_or(""))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_hash_deterministic(value in ".*") {
            prop_assert_eq!(hash(&value), hash(&value));
        }

        #[test]
        fn prop_hash_fixed_length_lower_hex(value in ".*") {
            let digest = hash(&value);
            prop_assert_eq!(digest.as_str().len(), DIGEST_LEN);
            prop_assert!(digest.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }

        #[test]
        fn prop_hash_separates_inputs(a in ".*", b in ".*") {
            prop_assume!(a != b);
            prop_assert_ne!(hash(&a), hash(&b));
        }
    }
}
