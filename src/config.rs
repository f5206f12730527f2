use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub dispatch: DispatchSettings,
}

/// Timing knobs shared by every worker session.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub poll_period: Duration,
    pub offer_ttl: Duration,
    pub resolved_history: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_secs(20),
            offer_ttl: Duration::from_secs(30),
            resolved_history: 32,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let poll_secs: u64 = parse_or_default("DISPATCH_POLL_SECS", 20)?;
        let ttl_secs: u64 = parse_or_default("OFFER_TTL_SECS", 30)?;
        if poll_secs == 0 {
            return Err(AppError::Internal(
                "DISPATCH_POLL_SECS must be > 0".to_string(),
            ));
        }
        if ttl_secs == 0 {
            return Err(AppError::Internal("OFFER_TTL_SECS must be > 0".to_string()));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dispatch: DispatchSettings {
                poll_period: Duration::from_secs(poll_secs),
                offer_ttl: Duration::from_secs(ttl_secs),
                resolved_history: parse_or_default("RESOLVED_OFFER_HISTORY", 32)?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
