//! Drive storage - admin entry point
//!
//! Initializes a principal's sandbox and prints a directory listing:
//!
//! ```text
//! drive-storage <principal> [dir]
//! ```

use log::{error, info};
use std::process::ExitCode;

use drive_storage::utils::logging::setup_logging;
use drive_storage::{FileType, Principal, StorageConfig, StorageEngine};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let mut args = std::env::args().skip(1);
    let Some(principal) = args.next() else {
        eprintln!("usage: drive-storage <principal> [dir]");
        return ExitCode::from(2);
    };
    let dir = args.next().unwrap_or_default();

    match run(&principal, &dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(principal: &str, dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorageConfig::load()?;
    info!("Storage root: {}", config.root.display());

    let engine = StorageEngine::new(config);
    let principal = Principal::new(principal)?;
    engine.init_root(&principal).await?;

    for entry in engine.list(&principal, dir).await? {
        let kind = match entry.file_type {
            FileType::File => "file",
            FileType::Directory => "dir",
            FileType::Unknown => "other",
        };
        println!("{kind:<6}{:>12}  {}", entry.size, entry.name);
    }
    Ok(())
}
