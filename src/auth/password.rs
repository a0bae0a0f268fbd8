use rand::distributions::{Alphanumeric, DistString};
use sha256::digest;

const ALGORITHM: &str = "sha256";
const SALT_LENGTH: usize = 16;

/// Hashes a raw password into `sha256$<salt>$<hex digest>`.
pub fn make_password(raw: &str) -> String {
    let salt = Alphanumeric.sample_string(&mut rand::thread_rng(), SALT_LENGTH);
    let hash = digest(format!("{salt}{raw}"));

    format!("{ALGORITHM}${salt}${hash}")
}

/// Checks a raw password against a value produced by [make_password].
/// Anything not in that format never matches.
pub fn check_password(raw: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(3, '$');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(ALGORITHM), Some(salt), Some(hash)) if !salt.is_empty() => {
            digest(format!("{salt}{raw}")) == hash
        }
        _ => false,
    }
}
