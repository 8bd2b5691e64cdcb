use tracing::info;

use crate::config::SpurConfig;
use crate::error::CliError;

pub async fn check_health(config: &SpurConfig) -> Result<(), CliError> {
    let client = config.client()?;
    info!("Checking {}", client.base_url());

    if client.health_check().await {
        println!("Spur server at {} is healthy", client.base_url());
        Ok(())
    } else {
        Err(CliError::Communication(format!(
            "Spur server at {} is not reachable",
            client.base_url()
        )))
    }
}
