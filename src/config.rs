use crate::error::FundError;

const DEFAULT_DB_NAME: &str = "funds";
const DEFAULT_FETCH_ATTEMPTS: u32 = 3;
const DEFAULT_PAUSE_MS: u64 = 100;

/// Runtime configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document store, e.g. "http://localhost:5984".
    pub db_url: String,
    pub db_name: String,
    /// Max transport-level attempts per HTTP request.
    pub fetch_attempts: u32,
    /// Fixed pause between batch iterations (rate limiting).
    pub pause_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, FundError> {
        let db_url = std::env::var("FUNDS_DB_URL")
            .map_err(|_| FundError::Config("FUNDS_DB_URL must be set".into()))?;
        let db_name =
            std::env::var("FUNDS_DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());
        let fetch_attempts = parse_env("FUNDS_FETCH_ATTEMPTS", DEFAULT_FETCH_ATTEMPTS)?;
        let pause_ms = parse_env("FUNDS_PAUSE_MS", DEFAULT_PAUSE_MS)?;

        Ok(Config {
            db_url: db_url.trim_end_matches('/').to_string(),
            db_name,
            fetch_attempts: fetch_attempts.max(1),
            pause_ms,
        })
    }
}

/// Fetch attempt count alone, for commands that never touch the store.
pub fn fetch_attempts_from_env() -> Result<u32, FundError> {
    Ok(parse_env("FUNDS_FETCH_ATTEMPTS", DEFAULT_FETCH_ATTEMPTS)?.max(1))
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, FundError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| FundError::Config(format!("{} is not a valid number: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
