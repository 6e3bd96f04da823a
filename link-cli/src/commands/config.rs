//! Print the effective configuration.

use anyhow::Result;
use wearlink_client::LinkConfig;

/// Run the config command.
pub fn run(config: &LinkConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
