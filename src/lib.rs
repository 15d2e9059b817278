pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod report;

pub use config::Config;
pub use error::{AgriSenseError, Result};
pub use logic::RulesEngine;
pub use report::Advisory;
