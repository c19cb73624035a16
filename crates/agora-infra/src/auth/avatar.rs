//! Gravatar avatar URLs.

use sha2::{Digest, Sha256};

use agora_core::domain::normalize_email;

/// Avatar for `email`: 200px, PG-rated, "mystery person" when the address
/// has no Gravatar.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}
