//! BLAKE3 fingerprints for construction keys and logical ids

use blake3::Hasher;

use crate::error::Result;

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Number of hex characters kept for logical id and physical name suffixes
const SHORT_HASH_LEN: usize = 8;

/// Calculate the BLAKE3 fingerprint of a configuration snapshot
///
/// `serde_json::Value` objects keep their keys sorted, so two snapshots that
/// differ only in field order produce the same fingerprint.
pub fn hash_config(kind: &str, config: &serde_json::Value) -> Result<String> {
    let bytes = serde_json::to_vec(config)?;

    let mut hasher = Hasher::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(&bytes);

    Ok(format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()))
}

/// Calculate a short uppercase hex digest over a sequence of path parts
pub fn short_hash<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update(b"\0"); // null separator
    }

    let hex = hasher.finalize().to_hex();
    hex[..SHORT_HASH_LEN].to_ascii_uppercase()
}

/// Strip the `blake3:` prefix for display purposes
pub fn display_hash(hash: &str) -> &str {
    let digest = hash.strip_prefix(HASH_PREFIX).unwrap_or(hash);
    &digest[..digest.len().min(12)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_config_prefix() {
        let hash = hash_config("Bucket", &serde_json::json!({"versioned": true})).unwrap();
        assert!(hash.starts_with(HASH_PREFIX));
    }

    #[test]
    fn test_hash_config_ignores_key_order() {
        let a: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(hash_config("K", &a).unwrap(), hash_config("K", &b).unwrap());
    }

    #[test]
    fn test_hash_config_includes_kind() {
        let value = serde_json::json!({});
        assert_ne!(
            hash_config("Frontend", &value).unwrap(),
            hash_config("Backend", &value).unwrap()
        );
    }

    #[test]
    fn test_short_hash_deterministic() {
        let first = short_hash(&["App", "Bucket"]);
        let second = short_hash(&["App", "Bucket"]);
        assert_eq!(first, second);
        assert_eq!(first.len(), SHORT_HASH_LEN);
    }

    #[test]
    fn test_short_hash_separates_parts() {
        assert_ne!(short_hash(&["ab", "c"]), short_hash(&["a", "bc"]));
    }

    #[test]
    fn test_display_hash() {
        assert_eq!(display_hash("blake3:0123456789abcdef"), "0123456789ab");
        assert_eq!(display_hash("abc"), "abc");
    }
}
