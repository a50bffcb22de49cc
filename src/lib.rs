pub mod cache;
pub mod config;
pub mod error;
pub mod font;
pub mod github;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod report;
pub mod state;

pub use error::{Error, Result};
