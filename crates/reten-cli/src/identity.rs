//! Per-device identity token.
//!
//! Generated once, persisted for the device's lifetime, and passed into
//! every core call. This is vote-dedup identity only, never a verified
//! account; the core itself never reads it from ambient state.

use anyhow::{Context as _, Result};
use rand::Rng as _;
use rand::distributions::Alphanumeric;
use std::path::{Path, PathBuf};

const TOKEN_CHARS: usize = 16;

/// Default location of the token file under the platform config dir.
pub fn default_token_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("no config directory available")?;
    Ok(config_dir.join("reten/device_token"))
}

/// Load the device token, generating and persisting one on first use.
pub fn load_or_create(path: &Path) -> Result<String> {
    if path.exists() {
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("read device token {}", path.display()))?;
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    rotate(path)
}

/// Replace the stored token with a fresh one and return it.
pub fn rotate(path: &Path) -> Result<String> {
    let token = generate();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create token directory {}", parent.display()))?;
    }
    std::fs::write(path, &token).with_context(|| format!("write device token {}", path.display()))?;

    tracing::info!(path = %path.display(), "device token rotated");
    Ok(token)
}

fn generate() -> String {
    let rng = rand::thread_rng();
    rng.sample_iter(&Alphanumeric)
        .take(TOKEN_CHARS)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
