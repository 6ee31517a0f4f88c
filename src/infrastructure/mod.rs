//! Infrastructure layer - Logging and application services

pub mod logging;
pub mod services;
