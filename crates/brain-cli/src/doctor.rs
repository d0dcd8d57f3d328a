//! Health check command, mirroring `astrid-cli`'s `doctor` subcommand: load
//! configuration, open every persisted store, and report what it finds.

use anyhow::Result;
use brain_config::BrainConfig;

use crate::wiring::Runtime;

/// Print a summary of configuration and store health.
pub fn run(config: &BrainConfig) -> Result<()> {
    println!("brain doctor");
    println!("  memory db:      {}", config.memory.db_path.display());
    println!("  idempotency:    {}", config.idempotency.store_path.display());
    println!("  finalizer type: {:?} (usable: {})", config.finalizer.finalizer_type, config.finalizer.finalizer_usable());
    println!("  gating mode:    {:?}", config.gating.finalizer_mode);

    match Runtime::build(config) {
        Ok(runtime) => {
            println!("  runtime init:   OK (session {})", runtime.session_id.as_str());
        }
        Err(err) => {
            println!("  runtime init:   FAIL ({err})");
        }
    }

    Ok(())
}
