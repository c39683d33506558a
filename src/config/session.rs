use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session, persisted as session.toml between invocations.
///
/// Created by a successful login and destroyed by logout. Commands that talk
/// to the API receive it explicitly instead of reading ambient state.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
