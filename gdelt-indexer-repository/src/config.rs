//! Connection settings for the ArangoDB provider.

use std::time::Duration;

/// Connection settings for an ArangoDB server.
#[derive(Debug, Clone)]
pub struct ArangoConfig {
    /// Server base URL, e.g. `http://localhost:8529`.
    pub url: String,
    /// Database holding the four collections.
    pub database: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ArangoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8529".to_string(),
            database: "Gdelt_DB".to_string(),
            username: "root".to_string(),
            password: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ArangoConfig {
    /// Create a config for the given server and database with default credentials.
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
