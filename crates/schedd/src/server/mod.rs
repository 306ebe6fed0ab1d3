pub mod bootstrap;
pub mod connection;

use std::time::Duration;

use negotiation::negotiation::NegotiationConfiguration;

pub const DEFAULT_PORT: u16 = 9618;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long a connection may wait for the next round before it is closed.
    pub idle_timeout: Duration,
    pub negotiation: NegotiationConfiguration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            negotiation: Default::default(),
        }
    }
}
