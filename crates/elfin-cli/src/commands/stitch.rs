use crate::cli::StitchArgs;
use crate::config::PartialConfig;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use elfin::core::database::xdb::AlignmentDatabase;
use elfin::engine::error::EngineError;
use elfin::engine::progress::ProgressReporter;
use elfin::workflows::{self, stitch::StitchJob};
use tracing::info;

pub fn run(args: StitchArgs) -> Result<()> {
    let data_manager = DataManager::new()?;
    let settings =
        PartialConfig::load(args.config.as_deref())?.merge_stitch(&args, &data_manager)?;
    info!("Resolved stitch configuration: {:?}", &settings);

    info!("Loading alignment database from {:?}", &settings.xdb_path);
    let db = AlignmentDatabase::load(&settings.xdb_path).map_err(EngineError::from)?;

    let jobs: Vec<StitchJob> = args
        .inputs
        .iter()
        .map(|input| StitchJob::new(input, settings.out_dir.as_deref(), settings.options.format))
        .collect();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Stitching {} design(s)...", jobs.len());
    let reports = workflows::stitch::run(
        &jobs,
        &db,
        &settings.config,
        &settings.options,
        &reporter,
    );

    let mut failed = 0;
    for report in &reports {
        match &report.result {
            Ok(outcome) => {
                println!(
                    "✓ {} -> {} ({} chain(s), {} residues, {} warning(s))",
                    report.input.display(),
                    outcome.output.display(),
                    outcome.chains,
                    outcome.residues,
                    outcome.warnings.len()
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("✗ {}: {}", report.input.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::DesignsFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}
