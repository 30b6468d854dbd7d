//! Print the resolved configuration with secrets redacted.

use std::path::Path;

use mongo_initdb_cli::{BootstrapConfig, BootstrapError};

/// Show which accessor supplied the configuration and the non-secret values.
///
/// # Errors
///
/// Returns an error if neither accessor yields a complete configuration.
pub fn run(env_file: &Path) -> Result<(), BootstrapError> {
    let resolved = BootstrapConfig::load(env_file)?;
    let config = &resolved.config;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", resolved.diagnostic());
        println!("  database:       {}", config.database);
        println!("  admin username: {}", config.admin_username);
        println!("  admin password: [REDACTED]");
        println!("  mongo uri:      [REDACTED]");
        println!("  owner role:     dbOwner on {}", config.database);
    }
    Ok(())
}
