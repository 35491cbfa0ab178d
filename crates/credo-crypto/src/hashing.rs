/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn content_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hex-encoded BLAKE3 hash, used to build local content addresses.
pub fn content_hash_hex(data: &[u8]) -> String {
    hex::encode(content_hash(data))
}
