//! Configuration inspection

use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::SpurConfig;
use crate::error::CliError;

pub fn handle_config_command(
    action: &ConfigCommands,
    config: &SpurConfig,
    path: &Path,
) -> Result<(), CliError> {
    match action {
        ConfigCommands::Show => {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}
