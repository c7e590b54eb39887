//! # Pipeline Config
//!
//! Layered configuration management: `config/default.toml` → `config/{env}.toml` →
//! `config/local.toml` → `PIPELINE_` environment variables.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
