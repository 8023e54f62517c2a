use crate::core::database::xdb::AlignmentDatabase;
use crate::core::metadata::hub_info::HubInfoTable;
use crate::engine::builder::{BuildReport, DatabaseBuilder};
use crate::engine::config::BuildConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use std::path::Path;
use tracing::{info, instrument};

/// Builds and saves the alignment database described by `config`.
#[instrument(skip_all, name = "build_workflow")]
pub fn run(
    config: &BuildConfig,
    reporter: &ProgressReporter,
) -> Result<(AlignmentDatabase, BuildReport), EngineError> {
    info!(
        library = %config.library_dir.display(),
        output = %config.output_path.display(),
        "Building alignment database."
    );
    DatabaseBuilder::new(config, reporter).run()
}

/// Converts a CSV hub table into the JSON form read by the builder.
///
/// Returns the number of hubs written.
#[instrument(skip_all, name = "hub_info_workflow")]
pub fn convert_hub_info(csv_path: &Path, output: &Path) -> Result<usize, EngineError> {
    let table = HubInfoTable::from_csv(csv_path)?;
    table.save(output)?;
    info!(
        hubs = table.len(),
        output = %output.display(),
        "Hub table converted."
    );
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::BuildConfigBuilder;
    use crate::engine::fixtures::write_library;
    use crate::engine::progress::Progress;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn run_saves_the_database_and_reports_phases() {
        let dir = tempdir().unwrap();
        let paths = write_library(dir.path(), 3);
        let config = BuildConfigBuilder::new()
            .library_dir(paths.library_dir)
            .hub_info_path(paths.hub_info_path)
            .aligned_dir(dir.path().join("aligned"))
            .output_path(dir.path().join("out").join("xdb.json"))
            .build()
            .unwrap();

        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        let (db, report) = run(&config, &reporter).unwrap();

        assert_eq!(report.database_path, config.output_path);
        assert_eq!(AlignmentDatabase::load(&config.output_path).unwrap(), db);
        assert_eq!(phases.lock().unwrap().len(), 3);
    }

    #[test]
    fn hub_csv_is_converted_to_json() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("hubs.csv");
        fs::write(
            &csv_path,
            "D4_C2_N.pdb,C2,symmetric,-,C_free\nA,D4,B,D4\n\
             D14_C2_C.pdb,C2,symmetric,N_free,-\nA,D14,B,D14\n",
        )
        .unwrap();
        let output = dir.path().join("hub_info.json");

        assert_eq!(convert_hub_info(&csv_path, &output).unwrap(), 2);
        let table = HubInfoTable::load(&output).unwrap();
        let hub = table.require("D4_C2_N").unwrap();
        assert!(hub.component_data["A"].c_free);
        assert!(!hub.component_data["B"].n_free);
    }

    #[test]
    fn missing_hub_csv_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(convert_hub_info(&dir.path().join("none.csv"), &dir.path().join("out.json")).is_err());
    }
}
