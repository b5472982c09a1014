use std::time::Duration;

use rand::seq::IndexedRandom;

/// Environment variable overriding the recreation.gov base URL.
pub const BASE_URL_ENV: &str = "CAMPSITE_FINDER_BASE_URL";

/// Transport configuration for the recreation.gov client.
///
/// User-agent selection happens here, as an explicit configuration step,
/// rather than as a hidden side effect of building the client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL for recreation.gov
    pub base_url: String,

    /// User agents to choose from
    pub user_agents: Vec<String>,

    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.recreation.gov".to_string(),
            user_agents: vec![
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            ],
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Picks one of the configured user agents at random, or `None` if
    /// the pool is empty.
    pub fn choose_user_agent(&self) -> Option<String> {
        self.user_agents.choose(&mut rand::rng()).cloned()
    }
}
