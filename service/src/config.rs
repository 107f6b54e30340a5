use std::net::SocketAddr;

const ADDR_VAR: &str = "NORMALIZER_ADDR";
const BODY_LIMIT_VAR: &str = "NORMALIZER_BODY_LIMIT";

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024; // 64 MiB

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} is not a valid byte count: {value}")]
    InvalidBodyLimit { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub body_limit: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr_value = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value.parse().map_err(|_| ConfigError::InvalidAddr {
            var: ADDR_VAR,
            value: addr_value.clone(),
        })?;

        let body_limit = match lookup(BODY_LIMIT_VAR) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidBodyLimit { var: BODY_LIMIT_VAR, value })?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Self { addr, body_limit })
    }
}
