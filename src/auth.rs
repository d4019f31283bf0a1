//! Per-session bearer token, minted once at startup and published to
//! sibling invocations via `BETTERHIST_AUTH`.

use rand::RngCore;

pub const AUTH_HEADER: &str = "X-Betterhist-Auth";
pub const SERVER_ENV_VAR: &str = "BETTERHIST_SERVER";
pub const AUTH_ENV_VAR: &str = "BETTERHIST_AUTH";

/// A random bearer token with at least 128 bits of entropy.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Mint a new token: 32 random bytes (256 bits), hex-encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

impl From<String> for AuthToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
