//! Environment-variable discovery. Deliberately thin: CLI argument parsing
//! proper lives in [`crate::cli`]; this just reads the three process-wide
//! variables spec'd for session handoff.

use thiserror::Error;

use crate::auth::{AUTH_ENV_VAR, SERVER_ENV_VAR};

const DEFAULT_SHELL: &str = "/bin/bash";

/// The shell a fresh session should wrap.
pub fn shell_to_spawn() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_string())
}

#[derive(Debug, Error)]
#[error("no history session found: run `betterhist` first to start one (BETTERHIST_SERVER/BETTERHIST_AUTH are not set)")]
pub struct ConfigMissing;

/// Where a sibling `get` invocation should find the live history, and the
/// token it must present. Fatal if either is missing.
pub struct ClientConfig {
    pub server_url: String,
    pub auth_token: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigMissing> {
        let server_url = std::env::var(SERVER_ENV_VAR).map_err(|_| ConfigMissing)?;
        let auth_token = std::env::var(AUTH_ENV_VAR).map_err(|_| ConfigMissing)?;
        Ok(Self { server_url, auth_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_both_env_vars_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(SERVER_ENV_VAR);
        std::env::remove_var(AUTH_ENV_VAR);
        assert!(ClientConfig::from_env().is_err());
    }

    #[test]
    fn present_env_vars_are_read_through() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(SERVER_ENV_VAR, "http://127.0.0.1:9");
        std::env::set_var(AUTH_ENV_VAR, "secret");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:9");
        assert_eq!(config.auth_token, "secret");
        std::env::remove_var(SERVER_ENV_VAR);
        std::env::remove_var(AUTH_ENV_VAR);
    }
}
