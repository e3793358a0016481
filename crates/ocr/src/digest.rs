use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of an uploaded image (64 chars). Identifies a scan
/// in logs without keeping the image around.
pub fn image_digest(data: &[u8]) -> String {
    let hash: [u8; 32] = Sha256::digest(data).into();
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
