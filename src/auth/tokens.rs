use rand::{rngs::OsRng, RngCore};

const TOKEN_BYTES: usize = 32;

/// 256 random bits, hex encoded.
pub fn issue_verification_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Exact match against the stored token. A cleared or empty stored token never matches.
pub fn token_matches(stored: Option<&str>, presented: &str) -> bool {
    let Some(stored) = stored.filter(|s| !s.is_empty()) else {
        return false;
    };
    let (a, b) = (stored.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
