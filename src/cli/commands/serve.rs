//! Serve Command
//!
//! Run the API gateway in the foreground.

use std::path::Path;

use crate::cli::util::load_config;
use crate::gateway;
use crate::types::Result;

pub async fn run(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.gateway.bind = bind;
        config.validate()?;
    }

    gateway::serve(&config).await
}
