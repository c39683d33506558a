mod session;
mod settings;

pub use session::Session;
pub use settings::{AnalyticsSettings, ApiSettings, Config, DisplaySettings};

use crate::error::{FreelanceError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.toml";

/// Get the config directory path (XDG config dir, falling back to ~/.freelance/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "freelance") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        FreelanceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".freelance"))
}

/// Fail with a helpful message when `init` has not been run yet
pub fn ensure_initialized(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        return Err(FreelanceError::ConfigNotFound(config_dir.to_path_buf()));
    }
    Ok(())
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Err(FreelanceError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| FreelanceError::ConfigParse { path, source: e })
}

/// Load session.toml, `None` when logged out
pub fn load_session(config_dir: &Path) -> Result<Option<Session>> {
    let path = config_dir.join(SESSION_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let session = toml::from_str(&content)
        .map_err(|e| FreelanceError::ConfigParse { path, source: e })?;
    Ok(Some(session))
}

/// Like [`load_session`], but a missing session is an error
pub fn require_session(config_dir: &Path) -> Result<Session> {
    load_session(config_dir)?.ok_or(FreelanceError::NotLoggedIn)
}

/// Persist a freshly created session
pub fn save_session(config_dir: &Path, session: &Session) -> Result<()> {
    let path = config_dir.join(SESSION_FILE);
    let content = toml::to_string_pretty(session).map_err(|e| FreelanceError::ConfigWrite {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(&path, content)?;
    info!(email = %session.email, "session created");
    Ok(())
}

/// Destroy the stored session. Returns whether one existed.
pub fn clear_session(config_dir: &Path) -> Result<bool> {
    let path = config_dir.join(SESSION_FILE);
    if !path.exists() {
        debug!("no session to clear");
        return Ok(false);
    }
    fs::remove_file(&path)?;
    info!("session destroyed");
    Ok(true)
}

/// Create the config directory and write the config template
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if config_dir.exists() {
        return Err(FreelanceError::AlreadyInitialized(config_dir.to_path_buf()));
    }
    fs::create_dir_all(config_dir)?;
    fs::write(config_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
base_url = "http://localhost:5000"
timeout_secs = 10

[analytics]
# "month-of-year": bucket by month name only, so a payment from the same
#                  month last year counts towards this month's bar
# "rolling":       strict trailing 12 calendar months
window = "month-of-year"

[display]
currency_symbol = "₹"
date_format = "%d/%m/%Y"
"#;
