use crate::cli::{DataArgs, DataCommands};
use crate::data::DataManager;
use crate::error::Result;
use std::path::Path;
use tracing::info;

pub fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::Path => handle_path(),
        DataCommands::SetPath { path } => handle_set_path(&path),
        DataCommands::ResetPath => handle_reset_path(),
    }
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    println!("{}", manager.get_data_path().display());
    Ok(())
}

fn handle_set_path(path: &Path) -> Result<()> {
    let absolute = std::path::absolute(path)?;
    DataManager::set_custom_path(&absolute)?;
    info!("Data path set to {:?}", &absolute);
    println!("✓ Data path set to: {}", absolute.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    DataManager::reset_path()?;
    let manager = DataManager::new()?;
    println!(
        "✓ Data path reset to default: {}",
        manager.get_data_path().display()
    );
    Ok(())
}
