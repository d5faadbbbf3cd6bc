//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/ringdesk/config.toml)
//! 3. Project config (.ringdesk/config.toml)
//! 4. Environment variables (RINGDESK_*)
//! 5. Legacy backend URL variables (PYTHON_SERVER_URL, PY_SERVER_URL)
//! 6. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
