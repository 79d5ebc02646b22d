use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY_KEY: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Query parameter holding the base64 session text.
    #[serde(default = "default_query_key")]
    pub query_key: String,
}

fn default_query_key() -> String {
    DEFAULT_QUERY_KEY.to_owned()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            query_key: default_query_key(),
        }
    }
}

impl SessionConfig {
    /// Blank keys are ignored.
    pub fn with_query_key(mut self, key: &str) -> Self {
        let key = key.trim();
        if !key.is_empty() {
            self.query_key = key.to_owned();
        }
        self
    }
}
