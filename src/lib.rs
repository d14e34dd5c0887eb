pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod connector;
pub mod key_pattern;
pub mod logger;
pub mod parser;
pub mod reader;
pub mod report;
pub mod session;
