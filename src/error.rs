use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/* ── helper: turn a bad env value into Config ── */
pub fn config<E: Display>(key: &str, e: E) -> AppErr {
    AppErr::Config(format!("{key}: {e}"))
}
