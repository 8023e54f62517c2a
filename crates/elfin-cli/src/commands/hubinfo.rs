use crate::cli::HubInfoArgs;
use crate::data::{DataManager, Resource};
use crate::error::Result;
use elfin::workflows;
use std::fs;

pub fn run(args: HubInfoArgs) -> Result<()> {
    let output = match args.output {
        Some(path) => path,
        None => DataManager::new()?.resolve(Resource::HubInfo),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let hubs = workflows::build::convert_hub_info(&args.input, &output)?;
    println!("✓ {} hub(s) written to {}", hubs, output.display());
    Ok(())
}
