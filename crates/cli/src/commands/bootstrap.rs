//! Provision and seed the configured database.
//!
//! This is what the container runs on first start.
//!
//! # Usage
//!
//! ```bash
//! # Read configuration from the environment, falling back to ./.env
//! initdb bootstrap
//!
//! # Use a different fallback file
//! initdb --env-file /docker-entrypoint-initdb.d/initdb.env bootstrap
//! ```

use std::path::Path;

use mongo_initdb_cli::{BootstrapConfig, BootstrapError, MongoTarget, store};
use tracing::info;

const START_BANNER: &str = "################################################################# START #################################################################";
const END_BANNER: &str = "################################################################### END ###################################################################";

/// Run the full bootstrap procedure.
///
/// # Errors
///
/// Returns an error if configuration cannot be resolved from either
/// accessor, or if any database step fails.
pub async fn run(env_file: &Path) -> Result<(), BootstrapError> {
    banner(START_BANNER);

    let resolved = BootstrapConfig::load(env_file)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{}", resolved.diagnostic());
    }
    let config = resolved.config;

    let client = store::connect(&config.mongo_uri).await?;
    let target = MongoTarget::select(&client, &config.database);
    let report = mongo_initdb_cli::seed(&target, &config).await?;

    info!(
        database = %report.database,
        admin_user = %report.admin_user,
        collection = report.collection,
        inserted = report.inserted,
        "Bootstrap complete"
    );

    banner(END_BANNER);
    Ok(())
}

fn banner(line: &str) {
    #[allow(clippy::print_stdout)]
    {
        println!("{line}");
    }
}
