use crate::core::database::xdb::AlignmentDatabase;
use crate::core::design::DesignError;
use crate::core::design::graph::DesignSpec;
use crate::core::io::format::{StructureFormat, write_structure_as};
use crate::engine::config::StitchConfig;
use crate::engine::error::EngineError;
use crate::engine::placement::place_network;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stitch::Stitcher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A design file and the structure file it is assembled into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl StitchJob {
    /// Names the output after the input's stem, inside `out_dir` or next to the input.
    pub fn new(input: &Path, out_dir: Option<&Path>, format: StructureFormat) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "design".to_string());
        let file_name = format!("{}.{}", stem, format.extension());
        let output = match out_dir {
            Some(dir) => dir.join(file_name),
            None => input.with_file_name(file_name),
        };
        Self {
            input: input.to_path_buf(),
            output,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StitchOptions {
    pub format: StructureFormat,
    /// Recompute node placements from the database, starting at this node.
    pub place_from: Option<String>,
}

/// Summary of one assembled design.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOutcome {
    pub output: PathBuf,
    pub chains: usize,
    pub residues: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct DesignReport {
    pub input: PathBuf,
    pub result: Result<DesignOutcome, EngineError>,
}

/// Assembles every job, in parallel when the `parallel` feature is enabled.
///
/// A failing design does not stop the others; its error is returned in its report.
#[instrument(skip_all, name = "stitch_workflow")]
pub fn run(
    jobs: &[StitchJob],
    db: &AlignmentDatabase,
    config: &StitchConfig,
    options: &StitchOptions,
    reporter: &ProgressReporter,
) -> Vec<DesignReport> {
    reporter.report(Progress::PhaseStart { name: "Stitching" });
    reporter.report(Progress::TaskStart {
        total: jobs.len() as u64,
    });
    info!(designs = jobs.len(), format = %options.format, "Stitching designs.");

    #[cfg(not(feature = "parallel"))]
    let iterator = jobs.iter();

    #[cfg(feature = "parallel")]
    let iterator = jobs.par_iter();

    let reports: Vec<DesignReport> = iterator
        .map(|job| {
            let result = stitch_design_file(job, db, config, options);
            if let Err(e) = &result {
                error!(design = %job.input.display(), error = %e, "Design failed.");
            }
            reporter.report(Progress::TaskIncrement);
            DesignReport {
                input: job.input.clone(),
                result,
            }
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    info!(
        succeeded = reports.len() - failed,
        failed, "Stitching finished."
    );
    reports
}

/// Loads, optionally re-places, stitches and writes one design.
pub fn stitch_design_file(
    job: &StitchJob,
    db: &AlignmentDatabase,
    config: &StitchConfig,
    options: &StitchOptions,
) -> Result<DesignOutcome, EngineError> {
    let mut spec = DesignSpec::load(&job.input)?;
    if let Some(root) = &options.place_from {
        place_design(&mut spec, db, root, &job.input)?;
    }

    let mut stitcher = Stitcher::new(config, db)?;
    let result = stitcher.stitch_design(&spec)?;

    if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
    }
    write_structure_as(&result.structure, &job.output, options.format)?;
    info!(
        design = %job.input.display(),
        output = %job.output.display(),
        chains = result.chains.len(),
        residues = result.residue_count(),
        "Design written."
    );

    Ok(DesignOutcome {
        output: job.output.clone(),
        chains: result.chains.len(),
        residues: result.residue_count(),
        warnings: result.warnings,
    })
}

/// Places every network that contains `root`; at least one must.
fn place_design(
    spec: &mut DesignSpec,
    db: &AlignmentDatabase,
    root: &str,
    input: &Path,
) -> Result<(), EngineError> {
    let mut placed = 0;
    for (name, network) in spec.networks.iter_mut() {
        if network.node(root).is_some() {
            place_network(name, network, db, root)?;
            placed += 1;
        }
    }
    if placed == 0 {
        return Err(DesignError::UnknownNode {
            network: input.to_string_lossy().to_string(),
            node: root.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::design::graph::{DesignNode, Network};
    use crate::core::io::format::read_structure;
    use crate::core::models::module::ModuleKind;
    use crate::engine::builder::DatabaseBuilder;
    use crate::engine::config::{BuildConfigBuilder, StitchConfigBuilder};
    use crate::engine::fixtures::{max_ca_step_error, single_len, write_library};
    use tempfile::tempdir;

    fn setup(root: &Path) -> (AlignmentDatabase, StitchConfig) {
        let paths = write_library(root, 5);
        let build = BuildConfigBuilder::new()
            .library_dir(paths.library_dir)
            .hub_info_path(paths.hub_info_path)
            .aligned_dir(root.join("aligned"))
            .output_path(root.join("xdb.json"))
            .build()
            .unwrap();
        let (db, _) = DatabaseBuilder::new(&build, &ProgressReporter::new())
            .run()
            .unwrap();
        let config = StitchConfigBuilder::new()
            .aligned_dir(build.aligned_dir)
            .cappings_dir(paths.cappings_dir)
            .metadata_dir(paths.metadata_dir)
            .disable_capping(true)
            .build()
            .unwrap();
        (db, config)
    }

    fn write_linear_design(path: &Path) {
        let mut network = Network::new();
        network.insert("a", DesignNode::new(ModuleKind::Single, "D4"));
        network.insert("b", DesignNode::new(ModuleKind::Single, "D14"));
        assert!(network.link(("a", "A"), ("b", "A")));
        let mut spec = DesignSpec::default();
        spec.networks.insert("net".into(), network);
        spec.save(path).unwrap();
    }

    #[test]
    fn job_output_follows_the_input_stem() {
        let job = StitchJob::new(Path::new("/in/design.json"), None, StructureFormat::Cif);
        assert_eq!(job.output, PathBuf::from("/in/design.cif"));
        let job = StitchJob::new(
            Path::new("/in/design.json"),
            Some(Path::new("/out")),
            StructureFormat::Pdb,
        );
        assert_eq!(job.output, PathBuf::from("/out/design.pdb"));
    }

    #[test]
    fn designs_are_written_with_placement_recomputed() {
        let dir = tempdir().unwrap();
        let (db, config) = setup(dir.path());
        let input = dir.path().join("linear.json");
        write_linear_design(&input);
        let job = StitchJob::new(&input, Some(&dir.path().join("out")), StructureFormat::Cif);
        let options = StitchOptions {
            place_from: Some("a".into()),
            ..StitchOptions::default()
        };

        let reports = run(
            std::slice::from_ref(&job),
            &db,
            &config,
            &options,
            &ProgressReporter::new(),
        );
        assert_eq!(reports.len(), 1);
        let outcome = reports[0].result.as_ref().unwrap();
        let residues = single_len("D4") + single_len("D14");
        assert_eq!(outcome.chains, 1);
        assert_eq!(outcome.residues, residues);
        assert_eq!(outcome.warnings.len(), 2);

        let structure = read_structure(&job.output).unwrap();
        let chain = structure.find_chain("A").unwrap();
        let cas = structure.ca_positions(chain).unwrap();
        assert_eq!(cas.len(), residues);
        assert!(max_ca_step_error(&cas) < 0.05);
    }

    #[test]
    fn failing_designs_do_not_stop_the_others() {
        let dir = tempdir().unwrap();
        let (db, config) = setup(dir.path());
        let good = dir.path().join("good.json");
        write_linear_design(&good);
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let jobs = vec![
            StitchJob::new(&good, None, StructureFormat::Pdb),
            StitchJob::new(&bad, None, StructureFormat::Pdb),
        ];

        let options = StitchOptions {
            format: StructureFormat::Pdb,
            place_from: Some("a".into()),
        };
        let reports = run(&jobs, &db, &config, &options, &ProgressReporter::new());
        assert!(reports[0].result.is_ok());
        assert!(jobs[0].output.exists());
        assert!(matches!(
            reports[1].result,
            Err(EngineError::Design(DesignError::Json { .. }))
        ));
        assert!(!jobs[1].output.exists());
    }

    #[test]
    fn unknown_placement_root_is_rejected() {
        let dir = tempdir().unwrap();
        let (db, config) = setup(dir.path());
        let input = dir.path().join("linear.json");
        write_linear_design(&input);
        let job = StitchJob::new(&input, None, StructureFormat::Cif);
        let options = StitchOptions {
            place_from: Some("zz".into()),
            ..StitchOptions::default()
        };
        assert!(matches!(
            stitch_design_file(&job, &db, &config, &options),
            Err(EngineError::Design(DesignError::UnknownNode { node, .. })) if node == "zz"
        ));
    }
}
