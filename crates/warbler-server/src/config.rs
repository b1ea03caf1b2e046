use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum_extra::extract::cookie::Key;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::warn;

pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    /// Base64 of at least 64 bytes. Unset means a fresh key per process.
    pub secret_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = env_or("WARBLER_DB_PATH", "warbler.db");
        let host = env_or("WARBLER_HOST", "0.0.0.0");
        let port: u16 = env_or("WARBLER_PORT", "5000")
            .parse()
            .context("WARBLER_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        Ok(Self {
            db_path: PathBuf::from(db_path),
            addr,
            static_dir: PathBuf::from(env_or("WARBLER_STATIC_DIR", "static")),
            secret_key: std::env::var("WARBLER_SECRET_KEY").ok(),
        })
    }

    pub fn cookie_key(&self) -> Result<Key> {
        match &self.secret_key {
            Some(encoded) => {
                let bytes = B64
                    .decode(encoded.trim())
                    .context("WARBLER_SECRET_KEY is not valid base64")?;
                Key::try_from(bytes.as_slice())
                    .map_err(|e| anyhow::anyhow!("WARBLER_SECRET_KEY is unusable: {}", e))
            }
            None => {
                warn!("No WARBLER_SECRET_KEY configured, generating random key. Sessions won't persist across restarts.");
                Ok(Key::generate())
            }
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}
