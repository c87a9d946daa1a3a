//! OBS v5 challenge-response authentication.

use base64::Engine;
use sha2::{Digest, Sha256};

/// Generate the `authentication` string for an Identify message.
///
/// Per the obs-websocket protocol:
/// 1. secret = base64(sha256(password + salt))
/// 2. auth   = base64(sha256(secret + challenge))
///
/// The second hash runs over the Base64 ASCII of the secret, not its raw
/// bytes.
pub fn generate_auth_string(password: &str, challenge: &str, salt: &str) -> String {
    let secret_hash = Sha256::digest(format!("{password}{salt}").as_bytes());
    let secret_base64 = base64::engine::general_purpose::STANDARD.encode(secret_hash);

    let auth_hash = Sha256::digest(format!("{secret_base64}{challenge}").as_bytes());
    base64::engine::general_purpose::STANDARD.encode(auth_hash)
}
