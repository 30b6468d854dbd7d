//! Connection check.

use std::path::Path;

use mongo_initdb_cli::{BootstrapConfig, BootstrapError, store};

/// Resolve configuration, connect and `ping` the server.
///
/// # Errors
///
/// Returns an error if configuration is unavailable or the server does not
/// answer.
pub async fn run(env_file: &Path) -> Result<(), BootstrapError> {
    let resolved = BootstrapConfig::load(env_file)?;
    tracing::info!(accessor = resolved.accessor, "Configuration resolved");

    // `connect` pings before returning.
    store::connect(&resolved.config.mongo_uri).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("MongoDB reachable (database: {})", resolved.config.database);
    }
    Ok(())
}
