/// Database configuration and connection management
pub mod database;

/// School configuration loading and seeding from config.toml
pub mod school;
