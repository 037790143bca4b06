pub mod aggregate;
pub mod app;
pub mod chart;
pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod payload;
pub mod runner;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::{load_config, resolve_config_path, Config};
pub use errors::MetricsError;
pub use models::{BreakdownEntry, Record};
pub use state::AppState;
pub use storage::{MetricsStore, SqliteStore};
