pub mod analyze;
pub mod auth;
pub mod config;
pub mod sessions;
pub mod timer;
