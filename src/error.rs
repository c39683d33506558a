use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreelanceError {
    #[error("Config directory not found at {0}. Run 'freelance init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Not logged in. Run 'freelance login' first.")]
    NotLoggedIn,

    #[error("Server rejected the credentials or session (HTTP {0}). Try 'freelance login' again.")]
    Unauthorized(u16),

    #[error("Request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("Could not reach {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid amount '{0}'. Amount must be a non-negative number.")]
    InvalidAmount(String),

    #[error("Invalid status '{value}'. Use one of: {expected}.")]
    InvalidStatus { value: String, expected: String },

    #[error("Invalid window '{0}'. Use 'month-of-year' or 'rolling'.")]
    InvalidWindow(String),

    #[error("Failed to read JSON from {path}: {source}")]
    InputParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Nothing to update for project '{0}'. Pass --name, --due or --status.")]
    NothingToUpdate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FreelanceError>;
