use sha2::{Digest, Sha256};

/// Whitespace-insensitive, case-insensitive content hash (hex SHA-256).
pub fn fingerprint(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<String>().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
