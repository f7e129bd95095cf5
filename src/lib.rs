pub mod broadcast;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod state;
