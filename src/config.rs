//! Relay configuration, read from the environment (a `.env` file is loaded
//! first by `main`).
//!
//! - `RELAY_BIND_ADDR`         (default: "0.0.0.0")
//! - `RELAY_PORT`              (default: 8080)
//! - `RELAY_LEADERBOARD_PATH`  (default: "leaderboard.json")
//! - `RELAY_STATIC_DIR`        (default: "static")
//! - `RELAY_MAX_MESSAGE_BYTES` (default: 4096)

use std::{env, path::PathBuf, str::FromStr};

use crate::error::{self, AppResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub leaderboard_path: PathBuf,
    pub static_dir: PathBuf,
    /// Upper bound for a single inbound WebSocket message.
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 8080,
            leaderboard_path: "leaderboard.json".into(),
            static_dir: "static".into(),
            max_message_bytes: 4096,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable lookup, so tests don't have
    /// to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Ok(Self {
            bind_addr: lookup("RELAY_BIND_ADDR").unwrap_or(d.bind_addr),
            port: parse_or(&lookup, "RELAY_PORT", d.port)?,
            leaderboard_path: lookup("RELAY_LEADERBOARD_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.leaderboard_path),
            static_dir: lookup("RELAY_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.static_dir),
            max_message_bytes: parse_or(&lookup, "RELAY_MAX_MESSAGE_BYTES", d.max_message_bytes)?,
        })
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| error::config(key, e)),
        None => Ok(default),
    }
}
