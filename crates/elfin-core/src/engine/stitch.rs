use super::blend::{blend_residues, cap_weights, displacement_weights};
use super::cache::StructureCache;
use super::config::StitchConfig;
use super::context::{JunctionContext, NodeRef};
use super::decompose::{ChainIdentifier, ChainStep, decompose};
use super::error::EngineError;
use super::placement::single_chain;
use crate::core::alignment::superposition::{MIN_ALIGNMENT_POINTS, superimpose};
use crate::core::alignment::transform::RigidTransform;
use crate::core::database::xdb::AlignmentDatabase;
use crate::core::design::DesignError;
use crate::core::design::graph::{DesignSpec, Network};
use crate::core::design::validate::{validate_design, validate_network};
use crate::core::metadata::repeat_index::{RepeatIndexTable, RepeatIndices};
use crate::core::models::module::{ModuleKind, Terminus};
use crate::core::models::residue::DetachedResidue;
use crate::core::models::structure::{Structure, StructureError};
use nalgebra::Point3;
use std::path::Path;
use tracing::{debug, info, warn};

const CHAIN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Label of the `index`-th output chain: `A..Z`, `a..z`, `0..9`, then two characters.
pub fn chain_label(index: usize) -> String {
    let n = CHAIN_ALPHABET.len();
    if index < n {
        return char::from(CHAIN_ALPHABET[index]).to_string();
    }
    let index = index - n;
    [CHAIN_ALPHABET[(index / n) % n], CHAIN_ALPHABET[index % n]]
        .iter()
        .map(|&b| char::from(b))
        .collect()
}

/// Name of the cap that closes `term` of a module: the first (N) or last (C)
/// `_`-separated token of the module name.
pub fn cap_name(module: &str, term: Terminus) -> &str {
    match term {
        Terminus::N => module.split('_').next().unwrap_or(module),
        Terminus::C => module.rsplit('_').next().unwrap_or(module),
    }
}

fn cap_file_name(cap: &str, term: Terminus) -> String {
    match term {
        Terminus::N => format!("{}_NI.pdb", cap),
        Terminus::C => format!("{}_IC.pdb", cap),
    }
}

fn ca_trace(residues: &[DetachedResidue], owner: &str) -> Result<Vec<Point3<f64>>, EngineError> {
    residues
        .iter()
        .map(|residue| {
            residue.ca_position().ok_or_else(|| {
                StructureError::MissingAtom {
                    chain: owner.to_string(),
                    residue: residue.number,
                    atom: "CA",
                }
                .into()
            })
        })
        .collect()
}

fn transformed(residues: &[DetachedResidue], transform: &RigidTransform) -> Vec<DetachedResidue> {
    residues
        .iter()
        .map(|residue| {
            let mut residue = residue.clone();
            residue.transform(transform);
            residue
        })
        .collect()
}

/// Fits a cap onto one end of `main` and returns the cap residues that extend past it.
///
/// The cap residue numbered `indices[0]` (N) or `indices[3]` (C) is the first residue shared
/// with the module; the shared run continues while residue names agree. The cap is
/// superimposed over the whole shared run, and the same window of `main` is blended toward
/// the placed cap.
pub fn cap_terminus(
    main: &mut [DetachedResidue],
    cap_residues: &[DetachedResidue],
    indices: &RepeatIndices,
    term: Terminus,
    cap: &str,
    module: &str,
) -> Result<Vec<DetachedResidue>, EngineError> {
    let anchor_number = match term {
        Terminus::N => indices[0],
        Terminus::C => indices[3],
    };
    let anchor = cap_residues
        .iter()
        .position(|residue| residue.number == anchor_number)
        .ok_or_else(|| EngineError::InvalidModule {
            name: cap.to_string(),
            reason: format!("cap has no residue numbered {}", anchor_number),
        })?;

    let matched = match term {
        Terminus::N => cap_residues[anchor..]
            .iter()
            .zip(main.iter())
            .take_while(|(c, m)| c.name == m.name)
            .count(),
        Terminus::C => cap_residues[..=anchor]
            .iter()
            .rev()
            .zip(main.iter().rev())
            .take_while(|(c, m)| c.name == m.name)
            .count(),
    };
    if matched < MIN_ALIGNMENT_POINTS {
        return Err(EngineError::CapAlignmentTooShort {
            cap: cap.to_string(),
            module: module.to_string(),
            matched,
        });
    }

    let len = main.len();
    let (cap_window, main_window) = match term {
        Terminus::N => (anchor..anchor + matched, 0..matched),
        Terminus::C => (anchor + 1 - matched..anchor + 1, len - matched..len),
    };

    let moving = ca_trace(&cap_residues[cap_window.clone()], cap)?;
    let fixed = ca_trace(&main[main_window.clone()], module)?;
    let fit = superimpose(&moving, &fixed)?;
    let placed = transformed(cap_residues, &fit);

    blend_residues(
        &mut main[main_window],
        &placed[cap_window],
        &cap_weights(matched, term),
    );
    debug!(cap, module, %term, matched, "Attached cap.");

    Ok(match term {
        Terminus::N => placed[..anchor].to_vec(),
        Terminus::C => placed[anchor + 1..].to_vec(),
    })
}

/// One chain of a stitched structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchedChain {
    pub label: String,
    pub nodes: Vec<ChainStep>,
    pub residues: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StitchResult {
    pub structure: Structure,
    pub chains: Vec<StitchedChain>,
    /// Soft problems that did not stop the stitch (uncapped termini, skipped components).
    pub warnings: Vec<String>,
}

impl StitchResult {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|chain| chain.residues).sum()
    }
}

/// Assembles design networks into continuous chains.
///
/// One stitcher serves one run: module files are cached on first use.
pub struct Stitcher<'a> {
    config: &'a StitchConfig,
    db: &'a AlignmentDatabase,
    cache: StructureCache,
    repeat_indices: Option<RepeatIndexTable>,
}

impl<'a> Stitcher<'a> {
    /// Creates a stitcher, loading the cap repeat indices when capping is enabled.
    pub fn new(config: &'a StitchConfig, db: &'a AlignmentDatabase) -> Result<Self, EngineError> {
        let repeat_indices = match &config.capping {
            Some(capping) => Some(RepeatIndexTable::load_from_dir(&capping.metadata_dir)?),
            None => None,
        };
        Ok(Self {
            config,
            db,
            cache: StructureCache::new(),
            repeat_indices,
        })
    }

    pub fn cache(&self) -> &StructureCache {
        &self.cache
    }

    /// Validates a design and stitches all of its networks into one structure.
    pub fn stitch_design(&mut self, spec: &DesignSpec) -> Result<StitchResult, EngineError> {
        validate_design(spec)?;
        let mut result = StitchResult::default();
        for (name, network) in &spec.networks {
            info!(network = %name, nodes = network.len(), "Stitching network.");
            self.deposit_network(network, &mut result)?;
        }
        Ok(result)
    }

    /// Validates and stitches a single network.
    pub fn stitch_network(&mut self, network: &Network) -> Result<StitchResult, EngineError> {
        validate_network(network)?;
        let mut result = StitchResult::default();
        self.deposit_network(network, &mut result)?;
        Ok(result)
    }

    fn deposit_network(
        &mut self,
        network: &Network,
        result: &mut StitchResult,
    ) -> Result<(), EngineError> {
        let decomposition = decompose(network, self.db, self.config.skip_unused)?;
        for step in &decomposition.skipped {
            result.warn(format!("Unused hub component {} was skipped.", step));
        }
        for chain in &decomposition.chains {
            let residues = self.deposit_chain(network, chain, result)?;
            let label = chain_label(result.chains.len());
            let count = residues.len();
            result.structure.append_residues(&label, residues);
            debug!(chain = %chain, label = %label, residues = count, "Deposited chain.");
            result.chains.push(StitchedChain {
                label,
                nodes: chain.nodes.clone(),
                residues: count,
            });
        }
        Ok(())
    }

    fn deposit_chain(
        &mut self,
        network: &Network,
        chain: &ChainIdentifier,
        result: &mut StitchResult,
    ) -> Result<Vec<DetachedResidue>, EngineError> {
        let steps = chain
            .nodes
            .iter()
            .map(|step| NodeRef::resolve(network, step))
            .collect::<Result<Vec<_>, _>>()?;

        let mut residues = Vec::new();
        for (i, current) in steps.iter().enumerate() {
            let previous = i.checked_sub(1).map(|j| steps[j]);
            let next = steps.get(i + 1).copied();
            let main = self.module_residues(current)?;
            let mut context = JunctionContext::new(*current, previous, next, main);

            for term in [Terminus::N, Terminus::C] {
                match context.neighbour(term) {
                    Some(neighbour) => self.displace(&mut context, neighbour, term)?,
                    None => self.cap(&mut context, term, result)?,
                }
            }

            let placement = current.node.transform();
            for mut residue in context.into_residues() {
                residue.transform(&placement);
                residues.push(residue);
            }
        }

        for (number, residue) in (1..).zip(residues.iter_mut()) {
            residue.renumber(number);
        }
        Ok(residues)
    }

    fn chain_residues(
        &mut self,
        path: &Path,
        kind: &'static str,
        chain: Option<&str>,
    ) -> Result<Vec<DetachedResidue>, EngineError> {
        let structure = self.cache.get_or_load(path, kind)?;
        let chain_id = match chain {
            Some(label) => structure.require_chain(label)?,
            None => structure
                .first_chain()
                .ok_or_else(|| EngineError::InvalidModule {
                    name: path.to_string_lossy().to_string(),
                    reason: "structure has no chains".into(),
                })?,
        };
        Ok(structure.residues_of(chain_id))
    }

    fn module_residues(&mut self, node: &NodeRef<'_>) -> Result<Vec<DetachedResidue>, EngineError> {
        let (path, kind) = match node.kind() {
            ModuleKind::Single => (self.config.single_path(node.module()), "single"),
            ModuleKind::Hub => (self.config.hub_path(node.module()), "hub"),
        };
        self.chain_residues(&path, kind, Some(node.chain))
    }

    /// Blends the half of `main` nearest `term` against the double spanning the junction.
    fn displace(
        &mut self,
        context: &mut JunctionContext<'_>,
        neighbour: NodeRef<'_>,
        term: Terminus,
    ) -> Result<(), EngineError> {
        let db = self.db;
        let current = context.current;
        let (a, b) = match term {
            Terminus::C => (current, neighbour),
            Terminus::N => (neighbour, current),
        };
        let a_single = db.effective_single_name(a.kind(), a.module(), a.chain)?;
        let b_single = db.effective_single_name(b.kind(), b.module(), b.chain)?;
        let (a_single_chain, rc_first) = single_chain(db, a_single)?;

        let junction = |kind: ModuleKind, name: &str, chain: &str| {
            db.require_link(kind, name, chain, Terminus::C, b.module(), b.chain)
                .map(|entry| entry.transform())
        };
        let into_frame = match (a.kind(), b.kind(), term) {
            (ModuleKind::Hub, ModuleKind::Hub, _) => {
                return Err(DesignError::HubToHub {
                    node: a.name.to_string(),
                    target: b.name.to_string(),
                }
                .into());
            }
            (ModuleKind::Single, _, Terminus::C) => None,
            (ModuleKind::Hub, ModuleKind::Single, Terminus::C) => {
                Some(junction(a.kind(), a.module(), a.chain)?.inverse())
            }
            (ModuleKind::Single, ModuleKind::Single, Terminus::N) => {
                Some(junction(a.kind(), a.module(), a.chain)?)
            }
            (ModuleKind::Hub, ModuleKind::Single, Terminus::N) => {
                Some(junction(ModuleKind::Single, a_single, a_single_chain)?)
            }
            (ModuleKind::Single, ModuleKind::Hub, Terminus::N) => {
                Some(junction(a.kind(), a.module(), a.chain)?.inverse())
            }
        };

        let path = self.config.double_path(a_single, b_single);
        let mut double = self.chain_residues(&path, "double", None)?;
        if let Some(transform) = into_frame {
            for residue in &mut double {
                residue.transform(&transform);
            }
        }

        let n = context.main.len() / 2;
        let len = context.main.len();
        let (main_window, reference_window) = match term {
            Terminus::C => (len - n..len, rc_first.saturating_sub(n)..rc_first),
            Terminus::N => (0..n, rc_first..rc_first + n),
        };
        if rc_first < n || reference_window.end > double.len() {
            return Err(EngineError::InsufficientReference {
                module: format!("{}-{}", a_single, b_single),
                side: term,
                needed: reference_window.end.max(n),
                available: double.len(),
            });
        }

        blend_residues(
            &mut context.main[main_window],
            &double[reference_window],
            &displacement_weights(n, term),
        );
        debug!(
            node = current.name,
            %term,
            double = %format!("{}-{}", a_single, b_single),
            residues = n,
            "Displaced terminus."
        );
        Ok(())
    }

    /// Closes a chain end: caps single termini, leaves dormant hub termini alone.
    fn cap(
        &mut self,
        context: &mut JunctionContext<'_>,
        term: Terminus,
        result: &mut StitchResult,
    ) -> Result<(), EngineError> {
        let config = self.config;
        let current = context.current;
        let terminus = current.terminus(term);

        if current.kind() == ModuleKind::Hub {
            if self
                .db
                .is_dormant(ModuleKind::Hub, current.module(), current.chain, term)?
            {
                return Ok(());
            }
            if config.capping_enabled() {
                return Err(EngineError::UnsupportedHubCapping {
                    node: current.name.to_string(),
                    chain: current.chain.to_string(),
                    term,
                });
            }
            result.warn(format!("Terminus {} is left uncapped and untrimmed.", terminus));
            return Ok(());
        }

        let Some(capping) = &config.capping else {
            result.warn(format!("Terminus {} is left uncapped and untrimmed.", terminus));
            return Ok(());
        };
        let cap = cap_name(current.module(), term);
        let indices = *self
            .repeat_indices
            .as_ref()
            .ok_or_else(|| EngineError::Internal("repeat indices were not loaded".into()))?
            .require(cap)?;

        let path = capping.cappings_dir.join(cap_file_name(cap, term));
        let cap_residues = self.chain_residues(&path, "cap", None)?;
        let extension = cap_terminus(
            &mut context.main,
            &cap_residues,
            &indices,
            term,
            cap,
            current.module(),
        )?;
        match term {
            Terminus::N => context.prefix = extension,
            Terminus::C => context.suffix = extension,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::design::graph::DesignNode;
    use crate::core::io::format::write_structure;
    use crate::engine::builder::DatabaseBuilder;
    use crate::engine::config::{BuildConfigBuilder, StitchConfigBuilder};
    use crate::engine::fixtures::{
        CAP_EXTENSION, HUB_BYPASS, HUB_C, HUB_N, helix_segment, max_ca_step_error, single_len, structure_of,
        write_library,
    };
    use crate::engine::placement::place_network;
    use crate::engine::progress::ProgressReporter;
    use tempfile::tempdir;

    const STEP_TOLERANCE: f64 = 0.05;

    struct Library {
        db: AlignmentDatabase,
        aligned_dir: std::path::PathBuf,
        cappings_dir: std::path::PathBuf,
        metadata_dir: std::path::PathBuf,
    }

    impl Library {
        fn build(root: &Path) -> Self {
            let paths = write_library(root, 11);
            let config = BuildConfigBuilder::new()
                .library_dir(paths.library_dir)
                .hub_info_path(paths.hub_info_path)
                .aligned_dir(root.join("aligned"))
                .output_path(root.join("xdb.json"))
                .build()
                .unwrap();
            let reporter = ProgressReporter::new();
            let (db, _) = DatabaseBuilder::new(&config, &reporter).run().unwrap();
            Self {
                db,
                aligned_dir: config.aligned_dir,
                cappings_dir: paths.cappings_dir,
                metadata_dir: paths.metadata_dir,
            }
        }

        fn config(&self, capping: bool, skip_unused: bool) -> StitchConfig {
            StitchConfigBuilder::new()
                .aligned_dir(self.aligned_dir.clone())
                .cappings_dir(self.cappings_dir.clone())
                .metadata_dir(self.metadata_dir.clone())
                .disable_capping(!capping)
                .skip_unused(skip_unused)
                .build()
                .unwrap()
        }
    }

    fn network(nodes: &[(&str, ModuleKind, &str)], links: &[(&str, &str, &str, &str)]) -> Network {
        let mut network = Network::new();
        for (name, kind, module) in nodes {
            network.insert(name, DesignNode::new(*kind, module));
        }
        for (from, from_chain, to, to_chain) in links {
            assert!(network.link((from, from_chain), (to, to_chain)));
        }
        network
    }

    fn chain_cas(result: &StitchResult, label: &str) -> Vec<Point3<f64>> {
        let chain = result.structure.find_chain(label).unwrap();
        result.structure.ca_positions(chain).unwrap()
    }

    fn chain_numbers(result: &StitchResult, label: &str) -> Vec<isize> {
        let chain = result.structure.find_chain(label).unwrap();
        result
            .structure
            .residues_of(chain)
            .iter()
            .map(|r| r.number)
            .collect()
    }

    #[test]
    fn chain_labels_cover_single_then_double_characters() {
        assert_eq!(chain_label(0), "A");
        assert_eq!(chain_label(25), "Z");
        assert_eq!(chain_label(26), "a");
        assert_eq!(chain_label(52), "0");
        assert_eq!(chain_label(61), "9");
        assert_eq!(chain_label(62), "AA");
        assert_eq!(chain_label(63), "AB");
        assert_eq!(chain_label(62 + 62), "BA");
    }

    #[test]
    fn cap_names_come_from_the_outer_tokens() {
        assert_eq!(cap_name("D4", Terminus::N), "D4");
        assert_eq!(cap_name("D4_j1_D14", Terminus::N), "D4");
        assert_eq!(cap_name("D4_j1_D14", Terminus::C), "D14");
    }

    #[test]
    fn cap_terminus_extends_and_keeps_a_continuous_helix() {
        let mut main = helix_segment(0, 24);
        let n_cap = helix_segment(-4, 12);
        let prefix = cap_terminus(&mut main, &n_cap, &[5, 6, 7, 8], Terminus::N, "D4", "D4").unwrap();
        assert_eq!(prefix.len(), 4);

        let c_cap = helix_segment(16, 12);
        let suffix = cap_terminus(&mut main, &c_cap, &[5, 6, 7, 8], Terminus::C, "D4", "D4").unwrap();
        assert_eq!(suffix.len(), 4);

        let all: Vec<DetachedResidue> = prefix.into_iter().chain(main).chain(suffix).collect();
        let cas = ca_trace(&all, "test").unwrap();
        assert!(max_ca_step_error(&cas) < 1e-6);
    }

    #[test]
    fn cap_is_fitted_over_the_whole_shared_run() {
        let mut main = helix_segment(0, 44);
        let mut cap = helix_segment(-4, 44);
        let drift = RigidTransform::from_translation(nalgebra::Vector3::new(0.0, 0.0, 0.8));
        for residue in cap.iter_mut().skip(24) {
            residue.transform(&drift);
        }
        let matched = cap.len() - 4;
        let indices = [5, 6, 7, 8];
        let expected = superimpose(
            &ca_trace(&cap[4..], "cap").unwrap(),
            &ca_trace(&main[..matched], "main").unwrap(),
        )
        .unwrap();

        let prefix = cap_terminus(&mut main, &cap, &indices, Terminus::N, "D4", "D4").unwrap();
        assert_eq!(prefix.len(), 4);
        let placed = transformed(&cap[..4], &expected);
        for (got, want) in ca_trace(&prefix, "got")
            .unwrap()
            .iter()
            .zip(ca_trace(&placed, "want").unwrap())
        {
            assert!((*got - want).norm() < 1e-9);
        }
    }

    #[test]
    fn cap_terminus_needs_three_matching_residues() {
        let mut main = helix_segment(0, 24);
        let mut cap = helix_segment(-4, 12);
        for residue in cap.iter_mut().skip(6) {
            residue.name = "PRO".into();
        }
        let err = cap_terminus(&mut main, &cap, &[5, 6, 7, 8], Terminus::N, "D4", "D4").unwrap_err();
        assert!(matches!(err, EngineError::CapAlignmentTooShort { matched: 2, .. }));

        let err = cap_terminus(&mut main, &cap, &[99, 6, 7, 8], Terminus::N, "D4", "D4").unwrap_err();
        assert!(matches!(err, EngineError::InvalidModule { .. }));
    }

    #[test]
    fn lone_single_is_capped_at_both_ends() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let config = library.config(true, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();

        let net = network(&[("x", ModuleKind::Single, "D14")], &[]);
        let result = stitcher.stitch_network(&net).unwrap();

        let expected = single_len("D14") + 2 * CAP_EXTENSION;
        assert_eq!(result.chains.len(), 1);
        assert_eq!(result.chains[0].label, "A");
        assert_eq!(result.chains[0].residues, expected);
        assert_eq!(chain_numbers(&result, "A"), (1..=expected as isize).collect::<Vec<_>>());
        assert!(max_ca_step_error(&chain_cas(&result, "A")) < STEP_TOLERANCE);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn linear_chain_fuses_into_one_continuous_helix() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let mut net = network(
            &[
                ("a", ModuleKind::Single, "D4"),
                ("b", ModuleKind::Single, "D14"),
                ("c", ModuleKind::Single, "D79"),
            ],
            &[("a", "A", "b", "A"), ("b", "A", "c", "A")],
        );
        place_network("net", &mut net, &library.db, "b").unwrap();

        let uncapped = library.config(false, false);
        let mut stitcher = Stitcher::new(&uncapped, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();
        let total = single_len("D4") + single_len("D14") + single_len("D79");
        assert_eq!(result.residue_count(), total);
        assert_eq!(chain_numbers(&result, "A"), (1..=total as isize).collect::<Vec<_>>());
        assert!(max_ca_step_error(&chain_cas(&result, "A")) < STEP_TOLERANCE);
        assert_eq!(result.warnings.len(), 2);

        let capped = library.config(true, false);
        let mut stitcher = Stitcher::new(&capped, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();
        assert_eq!(result.residue_count(), total + 2 * CAP_EXTENSION);
        assert!(max_ca_step_error(&chain_cas(&result, "A")) < STEP_TOLERANCE);
        assert!(stitcher.cache().len() >= 3 + 2 + 2);
    }

    #[test]
    fn hub_arms_become_separate_chains() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let mut net = network(
            &[
                ("hub", ModuleKind::Hub, HUB_C),
                ("s", ModuleKind::Single, "D14"),
                ("t", ModuleKind::Single, "D79"),
            ],
            &[("hub", "A", "s", "A"), ("hub", "B", "t", "A")],
        );
        place_network("net", &mut net, &library.db, "hub").unwrap();

        let config = library.config(true, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();

        assert_eq!(result.chains.len(), 2);
        let hub_len = single_len("D4");
        assert_eq!(result.chains[0].residues, hub_len + single_len("D14") + CAP_EXTENSION);
        assert_eq!(result.chains[1].residues, hub_len + single_len("D79") + CAP_EXTENSION);
        for label in ["A", "B"] {
            assert!(max_ca_step_error(&chain_cas(&result, label)) < STEP_TOLERANCE);
            assert_eq!(chain_numbers(&result, label)[0], 1);
        }
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn bypass_hub_arm_is_blended_on_both_sides() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let mut net = network(
            &[
                ("s1", ModuleKind::Single, "D14"),
                ("hub", ModuleKind::Hub, HUB_BYPASS),
                ("s2", ModuleKind::Single, "D79"),
                ("t", ModuleKind::Single, "D14"),
            ],
            &[("s1", "A", "hub", "A"), ("hub", "A", "s2", "A"), ("hub", "B", "t", "A")],
        );
        place_network("net", &mut net, &library.db, "s1").unwrap();

        let config = library.config(true, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();
        assert_eq!(result.chains.len(), 2);
        assert!(result.warnings.is_empty());

        let through = result
            .chains
            .iter()
            .find(|chain| chain.nodes.len() == 3)
            .unwrap();
        let steps: Vec<String> = through.nodes.iter().map(ToString::to_string).collect();
        assert_eq!(steps, vec!["s1:A", "hub:A", "s2:A"]);
        assert_eq!(
            through.residues,
            single_len("D14") + single_len("D4") + single_len("D79") + 2 * CAP_EXTENSION
        );

        let arm = result
            .chains
            .iter()
            .find(|chain| chain.nodes.len() == 2)
            .unwrap();
        assert_eq!(arm.residues, single_len("D4") + single_len("D14") + CAP_EXTENSION);

        for chain in &result.chains {
            assert!(max_ca_step_error(&chain_cas(&result, &chain.label)) < STEP_TOLERANCE);
        }
    }

    #[test]
    fn chains_entering_a_hub_end_inside_it() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let mut net = network(
            &[("s", ModuleKind::Single, "D4"), ("hub", ModuleKind::Hub, HUB_N)],
            &[("s", "A", "hub", "A")],
        );
        place_network("net", &mut net, &library.db, "s").unwrap();

        let config = library.config(true, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        assert!(matches!(
            stitcher.stitch_network(&net),
            Err(EngineError::UnsupportedHubCapping { chain, term: Terminus::N, .. }) if chain == "B"
        ));

        let config = library.config(true, true);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();
        assert_eq!(result.chains.len(), 1);
        assert_eq!(
            result.residue_count(),
            CAP_EXTENSION + single_len("D4") + single_len("D14")
        );
        assert!(max_ca_step_error(&chain_cas(&result, "A")) < STEP_TOLERANCE);
        assert_eq!(result.warnings.len(), 1);

        let config = library.config(false, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        let result = stitcher.stitch_network(&net).unwrap();
        assert_eq!(result.chains.len(), 2);
        assert_eq!(result.chains[1].residues, single_len("D14"));
    }

    #[test]
    fn missing_double_is_fatal() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        std::fs::remove_file(library.aligned_dir.join("doubles").join("D4-D14.pdb")).unwrap();
        let net = network(
            &[("a", ModuleKind::Single, "D4"), ("b", ModuleKind::Single, "D14")],
            &[("a", "A", "b", "A")],
        );
        let config = library.config(false, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        assert!(matches!(
            stitcher.stitch_network(&net),
            Err(EngineError::MissingReference { kind: "double", .. })
        ));
    }

    #[test]
    fn short_double_is_an_insufficient_reference() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let short = structure_of(vec![("A", helix_segment(0, 30))]);
        write_structure(&short, &library.aligned_dir.join("doubles").join("D4-D14.pdb")).unwrap();
        let net = network(
            &[("a", ModuleKind::Single, "D4"), ("b", ModuleKind::Single, "D14")],
            &[("a", "A", "b", "A")],
        );
        let config = library.config(false, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();
        assert!(matches!(
            stitcher.stitch_network(&net),
            Err(EngineError::InsufficientReference {
                side: Terminus::N,
                needed: 40,
                available: 30,
                ..
            })
        ));
    }

    #[test]
    fn designs_are_validated_before_stitching() {
        let dir = tempdir().unwrap();
        let library = Library::build(dir.path());
        let config = library.config(false, false);
        let mut stitcher = Stitcher::new(&config, &library.db).unwrap();

        let empty = DesignSpec::default();
        assert!(matches!(
            stitcher.stitch_design(&empty),
            Err(EngineError::Design(DesignError::NoNetworks))
        ));

        let mut spec = DesignSpec::default();
        spec.networks.insert(
            "one".into(),
            network(&[("x", ModuleKind::Single, "D4")], &[]),
        );
        spec.networks.insert(
            "two".into(),
            network(&[("y", ModuleKind::Single, "D79")], &[]),
        );
        let result = stitcher.stitch_design(&spec).unwrap();
        let labels: Vec<&str> = result.chains.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert_eq!(result.warnings.len(), 4);
    }
}
