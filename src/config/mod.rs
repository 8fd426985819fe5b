/// Database configuration and connection management
pub mod database;

/// Migration settings from migrate.toml and content API credentials from the environment
pub mod settings;
