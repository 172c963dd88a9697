pub mod app;
pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use app::{App, Dashboard};
pub use config::Config;
pub use error::{AppError, FetchError, Result};
