use crate::cli::BuildArgs;
use crate::config::PartialConfig;
use crate::data::DataManager;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use elfin::engine::progress::ProgressReporter;
use elfin::workflows;
use tracing::info;

pub fn run(args: BuildArgs) -> Result<()> {
    let data_manager = DataManager::new()?;
    let config = PartialConfig::load(args.config.as_deref())?.merge_build(&args, &data_manager)?;
    info!("Resolved build configuration: {:?}", &config);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Building alignment database from {}", config.library_dir.display());
    let (_, report) = workflows::build::run(&config, &reporter)?;

    println!(
        "✓ {} singles, {} doubles, {} hubs -> {} transforms written to {}",
        report.singles,
        report.doubles,
        report.hubs,
        report.transforms,
        report.database_path.display()
    );
    Ok(())
}
