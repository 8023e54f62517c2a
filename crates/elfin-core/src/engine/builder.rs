use super::config::BuildConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::alignment::superposition::{AlignmentRequest, MIN_ALIGNMENT_POINTS, fusion_window};
use crate::core::alignment::transform::RigidTransform;
use crate::core::database::entries::{
    ChainEntry, HubChainEntry, HubEntry, Radii, SingleEntry, TransformEntry,
};
use crate::core::database::xdb::AlignmentDatabase;
use crate::core::io::format::{StructureFormat, read_structure, write_structure};
use crate::core::metadata::hub_info::HubInfoTable;
use crate::core::models::module::ModuleKind;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{centroid, max_distance_from, mean_distance_from};
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Translates a structure so that the centroid of its CA atoms sits at the origin.
pub fn center_module(structure: &mut Structure) -> Result<(), EngineError> {
    let mut cas = Vec::new();
    for (chain_id, _) in structure.chains() {
        cas.extend(structure.ca_positions(chain_id)?);
    }
    let center = centroid(&cas)
        .ok_or_else(|| EngineError::Internal("cannot centre a structure without CA atoms".into()))?;
    structure.translate(&-center.coords);
    Ok(())
}

/// Size descriptors of a centred module.
pub fn radii(structure: &Structure) -> Radii {
    let origin = Point3::origin();
    let all: Vec<Point3<f64>> = structure.atoms_iter().map(|(_, a)| a.position).collect();
    let heavy: Vec<Point3<f64>> = structure
        .atoms_iter()
        .filter(|(_, a)| a.is_heavy())
        .map(|(_, a)| a.position)
        .collect();
    let ca: Vec<Point3<f64>> = structure
        .atoms_iter()
        .filter(|(_, a)| a.name == "CA")
        .map(|(_, a)| a.position)
        .collect();
    Radii {
        average_all: mean_distance_from(&origin, &all),
        max_ca_dist: max_distance_from(&origin, &ca),
        max_heavy_dist: max_distance_from(&origin, &heavy),
    }
}

/// CA trace of the first (only) chain of a module.
fn first_chain_cas(name: &str, structure: &Structure) -> Result<Vec<Point3<f64>>, EngineError> {
    let chain = structure.first_chain().ok_or_else(|| EngineError::InvalidModule {
        name: name.to_string(),
        reason: "structure has no chains".into(),
    })?;
    Ok(structure.ca_positions(chain)?)
}

fn checked_window(name: &str, residue_count: usize) -> Result<usize, EngineError> {
    let window = fusion_window(residue_count);
    if window < MIN_ALIGNMENT_POINTS {
        return Err(EngineError::InvalidModule {
            name: name.to_string(),
            reason: format!(
                "{} residues give a fusion window of {}, at least {} are needed",
                residue_count, window, MIN_ALIGNMENT_POINTS
            ),
        });
    }
    Ok(window)
}

/// A centred single, ready for pairing.
#[derive(Debug, Clone)]
pub struct CenteredSingle {
    pub name: String,
    pub chain: String,
    pub structure: Structure,
    pub cas: Vec<Point3<f64>>,
}

impl CenteredSingle {
    pub fn new(name: &str, mut structure: Structure) -> Result<Self, EngineError> {
        if structure.chain_count() != 1 {
            return Err(EngineError::InvalidModule {
                name: name.to_string(),
                reason: format!("singles need exactly one chain, found {}", structure.chain_count()),
            });
        }
        center_module(&mut structure)?;
        let chain = structure
            .chain_labels()
            .first()
            .map(|label| label.to_string())
            .unwrap_or_default();
        let cas = first_chain_cas(name, &structure)?;
        Ok(Self {
            name: name.to_string(),
            chain,
            structure,
            cas,
        })
    }

    pub fn residue_count(&self) -> usize {
        self.cas.len()
    }
}

/// A double moved into the frame of its N-side single, plus the junction transform.
#[derive(Debug, Clone)]
pub struct AlignedDouble {
    pub name: String,
    pub single_a: String,
    pub single_b: String,
    pub structure: Structure,
    /// Maps the aligned double (single A's frame) into single B's frame.
    pub transform: RigidTransform,
}

/// Splits `A-B` into its two single names.
pub fn split_double_name(name: &str) -> Result<(&str, &str), EngineError> {
    let parts: Vec<&str> = name.split('-').collect();
    match parts.as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(EngineError::InvalidModule {
            name: name.to_string(),
            reason: "double names must join exactly two singles with '-'".into(),
        }),
    }
}

/// Aligns a double onto its first single and derives the transform into its second.
///
/// The double is first superimposed onto `single_a` over a fusion window ending at the
/// middle of A, then the transform taking the double's B part onto `single_b` is fitted
/// over a fusion window ending at the middle of B. Both windows avoid the ends of the
/// singles, which are shaped by whichever interface they were relaxed against.
pub fn build_pair_transform(
    single_a: &CenteredSingle,
    single_b: &CenteredSingle,
    name: &str,
    mut double: Structure,
) -> Result<AlignedDouble, EngineError> {
    let rc_a = single_a.residue_count();
    let rc_b = single_b.residue_count();
    let window_a = checked_window(&single_a.name, rc_a)?;
    let window_b = checked_window(&single_b.name, rc_b)?;

    let double_cas = first_chain_cas(name, &double)?;
    if double_cas.len() != rc_a + rc_b {
        warn!(
            double = name,
            residues = double_cas.len(),
            expected = rc_a + rc_b,
            "Double residue count differs from its singles."
        );
    }

    let to_a = AlignmentRequest {
        moving: &double_cas,
        fixed: &single_a.cas,
        moving_offset: rc_a / 2 - window_a,
        fixed_offset: rc_a / 2 - window_a,
        window_len: window_a,
    }
    .solve()?;
    double.transform(&to_a);

    let aligned_cas = first_chain_cas(name, &double)?;
    let b_offset = rc_b.div_ceil(2) - window_b;
    let to_b = AlignmentRequest {
        moving: &aligned_cas,
        fixed: &single_b.cas,
        moving_offset: rc_a + b_offset,
        fixed_offset: b_offset,
        window_len: window_b,
    }
    .solve()?;

    Ok(AlignedDouble {
        name: name.to_string(),
        single_a: single_a.name.clone(),
        single_b: single_b.name.clone(),
        structure: double,
        transform: to_b,
    })
}

/// Side of a hub component that a hub transform is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubSide {
    /// The component's C terminus joins the N terminus of the double's B part.
    CFree,
    /// The component's N terminus joins the C terminus of the double's A part.
    NFree,
}

/// Fits a hub component onto an aligned double.
///
/// The result maps hub coordinates into the frame of the double, which is the frame of the
/// double's A single. Hub atoms themselves are never moved.
pub fn build_hub_transform(
    hub_chain_cas: &[Point3<f64>],
    component_single: &CenteredSingle,
    double_a_len: usize,
    double: &AlignedDouble,
    side: HubSide,
) -> Result<RigidTransform, EngineError> {
    let rc_s = component_single.residue_count();
    let window = checked_window(&component_single.name, rc_s)?;
    let double_cas = first_chain_cas(&double.name, &double.structure)?;
    let request = match side {
        HubSide::CFree => AlignmentRequest {
            moving: hub_chain_cas,
            fixed: &double_cas,
            moving_offset: hub_chain_cas.len().saturating_sub(window),
            fixed_offset: rc_s - window,
            window_len: window,
        },
        HubSide::NFree => AlignmentRequest {
            moving: hub_chain_cas,
            fixed: &double_cas,
            moving_offset: 0,
            fixed_offset: double_a_len,
            window_len: window,
        },
    };
    Ok(request.solve()?)
}

fn align_double_file(
    config: &BuildConfig,
    name: &str,
    path: &Path,
    single_a: &CenteredSingle,
    single_b: &CenteredSingle,
) -> Result<AlignedDouble, EngineError> {
    let double = read_structure(path)?;
    let aligned = build_pair_transform(single_a, single_b, name, double)?;
    write_structure(&aligned.structure, &config.aligned_path("doubles", name))?;
    Ok(aligned)
}

/// Counts of one database build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub singles: usize,
    pub doubles: usize,
    pub hubs: usize,
    pub transforms: usize,
    pub database_path: PathBuf,
}

/// Lists `*.pdb`/`*.cif` module files of a directory, sorted by module name.
///
/// A missing directory yields an empty list.
pub fn list_modules(dir: &Path) -> Result<Vec<(String, PathBuf)>, EngineError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Module directory does not exist.");
        return Ok(Vec::new());
    }
    let mut modules = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))? {
        let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
        if StructureFormat::from_path(&path).is_none() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            modules.push((stem.to_string(), path.clone()));
        }
    }
    modules.sort();
    Ok(modules)
}

fn create_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::io(path, e))
}

/// Builds the alignment database from a relaxed module library.
pub struct DatabaseBuilder<'a> {
    config: &'a BuildConfig,
    reporter: &'a ProgressReporter<'a>,
    db: AlignmentDatabase,
    singles: BTreeMap<String, CenteredSingle>,
    doubles: BTreeMap<(String, String), AlignedDouble>,
}

impl<'a> DatabaseBuilder<'a> {
    pub fn new(config: &'a BuildConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self {
            config,
            reporter,
            db: AlignmentDatabase::new(),
            singles: BTreeMap::new(),
            doubles: BTreeMap::new(),
        }
    }

    /// Runs every phase and saves the database.
    pub fn run(mut self) -> Result<(AlignmentDatabase, BuildReport), EngineError> {
        let hub_info = HubInfoTable::load(&self.config.hub_info_path)?;
        for category in ["singles", "doubles", "hubs"] {
            create_dir(&self.config.aligned_dir.join(category))?;
        }

        let reporter = self.reporter;
        reporter.phase("Centring singles", || self.process_singles())?;
        let doubles = reporter.phase("Aligning doubles", || self.process_doubles())?;
        let hubs = reporter.phase("Aligning hubs", || self.process_hubs(&hub_info))?;

        self.db.save(&self.config.output_path)?;
        let report = BuildReport {
            singles: self.db.modules.singles.len(),
            doubles,
            hubs,
            transforms: self.db.n_to_c_tx.len(),
            database_path: self.config.output_path.clone(),
        };
        info!(
            singles = report.singles,
            doubles = report.doubles,
            hubs = report.hubs,
            transforms = report.transforms,
            "Alignment database written to {}.",
            report.database_path.display()
        );
        Ok((self.db, report))
    }

    fn process_singles(&mut self) -> Result<(), EngineError> {
        let modules = list_modules(&self.config.singles_dir())?;
        self.reporter.report(Progress::TaskStart {
            total: modules.len() as u64,
        });
        for (name, path) in modules {
            let single = CenteredSingle::new(&name, read_structure(&path)?)?;
            checked_window(&name, single.residue_count())?;

            let mut entry = SingleEntry {
                chains: BTreeMap::new(),
                radii: radii(&single.structure),
            };
            entry
                .chains
                .insert(single.chain.clone(), ChainEntry::new(single.residue_count()));
            self.db.modules.singles.insert(name.clone(), entry);

            write_structure(
                &single.structure,
                &self.config.aligned_path("singles", &name),
            )?;
            debug!(single = %name, residues = single.residue_count(), "Centred single.");
            self.singles.insert(name, single);
            self.reporter.report(Progress::TaskIncrement);
        }
        self.reporter.report(Progress::TaskFinish);
        Ok(())
    }

    fn process_doubles(&mut self) -> Result<usize, EngineError> {
        let modules = list_modules(&self.config.doubles_dir())?;
        let mut jobs = Vec::with_capacity(modules.len());
        for (name, path) in modules {
            let (a, b) = split_double_name(&name)?;
            let single_a = self
                .singles
                .get(a)
                .ok_or_else(|| EngineError::MissingModule(a.to_string()))?;
            let single_b = self
                .singles
                .get(b)
                .ok_or_else(|| EngineError::MissingModule(b.to_string()))?;
            jobs.push((name.clone(), path, single_a, single_b));
        }

        self.reporter.report(Progress::TaskStart {
            total: jobs.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = jobs.iter();

        #[cfg(feature = "parallel")]
        let iterator = jobs.par_iter();

        let config = self.config;
        let reporter = self.reporter;
        let results: Vec<Result<AlignedDouble, EngineError>> = iterator
            .map(|(name, path, single_a, single_b)| {
                let result = align_double_file(config, name, path, single_a, single_b);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect();
        self.reporter.report(Progress::TaskFinish);

        let count = results.len();
        for result in results {
            let aligned = result?;
            let chain_a = self.single_chain(&aligned.single_a)?;
            let chain_b = self.single_chain(&aligned.single_b)?;
            self.db.connect(
                (ModuleKind::Single, &aligned.single_a, &chain_a),
                (ModuleKind::Single, &aligned.single_b, &chain_b),
                TransformEntry::new(
                    (&aligned.single_a, &chain_a),
                    (&aligned.single_b, &chain_b),
                    &aligned.transform,
                ),
            )?;
            self.doubles.insert(
                (aligned.single_a.clone(), aligned.single_b.clone()),
                aligned,
            );
        }
        Ok(count)
    }

    fn single_chain(&self, name: &str) -> Result<String, EngineError> {
        self.singles
            .get(name)
            .map(|s| s.chain.clone())
            .ok_or_else(|| EngineError::MissingModule(name.to_string()))
    }

    fn process_hubs(&mut self, hub_info: &HubInfoTable) -> Result<usize, EngineError> {
        let modules = list_modules(&self.config.hubs_dir())?;
        self.reporter.report(Progress::TaskStart {
            total: modules.len() as u64,
        });
        let count = modules.len();
        for (name, path) in modules {
            let info = hub_info.require(&name)?;
            let mut hub = read_structure(&path)?;
            center_module(&mut hub)?;

            let mut chains = BTreeMap::new();
            let mut traces = BTreeMap::new();
            for (chain, component) in &info.component_data {
                let chain_id = hub.find_chain(chain).ok_or_else(|| EngineError::InvalidModule {
                    name: name.clone(),
                    reason: format!("hub metadata names chain '{}' which the file lacks", chain),
                })?;
                let cas = hub.ca_positions(chain_id)?;
                chains.insert(
                    chain.clone(),
                    HubChainEntry {
                        single_name: component.single_name.clone(),
                        n_free: component.n_free,
                        c_free: component.c_free,
                        links: ChainEntry::new(cas.len()),
                    },
                );
                traces.insert(chain.clone(), cas);
            }
            self.db.modules.hubs.insert(
                name.clone(),
                HubEntry {
                    oligomer_type: info.oligomer_type.clone(),
                    symmetric: info.symmetric,
                    chains,
                    radii: radii(&hub),
                },
            );

            for (chain, component) in &info.component_data {
                let cas = &traces[chain];
                if component.c_free {
                    self.link_hub_c_side(&name, chain, &component.single_name, cas)?;
                }
                if component.n_free {
                    self.link_hub_n_side(&name, chain, &component.single_name, cas)?;
                }
            }

            write_structure(&hub, &self.config.aligned_path("hubs", &name))?;
            debug!(hub = %name, chains = info.component_data.len(), "Aligned hub.");
            self.reporter.report(Progress::TaskIncrement);
        }
        self.reporter.report(Progress::TaskFinish);
        Ok(count)
    }

    /// Records `hub:chain → B` for every double `S-B`.
    fn link_hub_c_side(
        &mut self,
        hub: &str,
        chain: &str,
        single: &str,
        cas: &[Point3<f64>],
    ) -> Result<(), EngineError> {
        let component = self
            .singles
            .get(single)
            .ok_or_else(|| EngineError::MissingModule(single.to_string()))?;
        let partners: Vec<&AlignedDouble> = self
            .doubles
            .iter()
            .filter(|((a, _), _)| a == single)
            .map(|(_, double)| double)
            .collect();

        let mut entries = Vec::with_capacity(partners.len());
        for double in partners {
            let hub_tx =
                build_hub_transform(cas, component, component.residue_count(), double, HubSide::CFree)?;
            let chain_b = self.single_chain(&double.single_b)?;
            entries.push((double.single_b.clone(), chain_b, hub_tx));
        }
        for (single_b, chain_b, hub_tx) in entries {
            self.db.connect(
                (ModuleKind::Hub, hub, chain),
                (ModuleKind::Single, &single_b, &chain_b),
                TransformEntry::new((hub, chain), (&single_b, &chain_b), &hub_tx),
            )?;
        }
        Ok(())
    }

    /// Records `A → hub:chain` for every double `A-S`.
    fn link_hub_n_side(
        &mut self,
        hub: &str,
        chain: &str,
        single: &str,
        cas: &[Point3<f64>],
    ) -> Result<(), EngineError> {
        let component = self
            .singles
            .get(single)
            .ok_or_else(|| EngineError::MissingModule(single.to_string()))?;

        let mut entries = Vec::new();
        for ((a, b), double) in &self.doubles {
            if b != single {
                continue;
            }
            let rc_a = self
                .singles
                .get(a)
                .map(CenteredSingle::residue_count)
                .ok_or_else(|| EngineError::MissingModule(a.clone()))?;
            let hub_tx = build_hub_transform(cas, component, rc_a, double, HubSide::NFree)?;
            entries.push((a.clone(), self.single_chain(a)?, hub_tx));
        }
        for (single_a, chain_a, hub_tx) in entries {
            self.db.connect(
                (ModuleKind::Single, &single_a, &chain_a),
                (ModuleKind::Hub, hub, chain),
                TransformEntry::new((&single_a, &chain_a), (hub, chain), &hub_tx),
            )?;
        }
        Ok(())
    }
}
