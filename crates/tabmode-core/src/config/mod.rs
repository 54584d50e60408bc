// Tabmode Configuration
// Optional TOML configuration for the relay allow-list and virtual device

pub mod parser;

pub use parser::{Config, ConfigError};
