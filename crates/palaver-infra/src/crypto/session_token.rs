//! Session token minting and keyed hashing.
//!
//! Tokens are 32 bytes from the OS CSPRNG, hex-encoded. The database stores
//! only HMAC-SHA256(session_secret, token), so a leaked sessions table
//! cannot be replayed without the server secret.

use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use palaver_core::auth::token::SessionTokens;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 implementation of `SessionTokens`.
#[derive(Clone)]
pub struct HmacSessionTokens {
    mac: HmacSha256,
}

impl HmacSessionTokens {
    /// Key the hash with the server's session secret.
    pub fn new(secret: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }
}

impl SessionTokens for HmacSessionTokens {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex_encode(&bytes)
    }

    fn hash(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex_encode(&mac.finalize().into_bytes())
    }
}

/// Hex-encode bytes to string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
