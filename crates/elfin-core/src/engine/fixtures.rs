//! Synthetic module library used by engine and workflow tests.
//!
//! Every module is cut from one ideal helix, so any correctly assembled design is itself
//! a piece of that helix: consecutive CA atoms sit a constant distance apart.

use crate::core::alignment::transform::RigidTransform;
use crate::core::io::format::write_structure;
use crate::core::metadata::hub_info::{ComponentInfo, HubInfo, HubInfoTable};
use crate::core::metadata::repeat_index::REPEAT_INDEX_FILE;
use crate::core::models::atom::Atom;
use crate::core::models::residue::DetachedResidue;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const HELIX_RADIUS: f64 = 2.3;
const HELIX_TWIST_DEG: f64 = 100.0;
const HELIX_RISE: f64 = 1.5;
const RESIDUE_NAMES: [&str; 4] = ["ALA", "LEU", "GLU", "LYS"];

/// Residues of each cap that extend past the module.
pub(crate) const CAP_EXTENSION: usize = 4;
/// Residues each cap shares with its module.
pub(crate) const CAP_OVERLAP: usize = 8;

/// Singles of the synthetic library and their lengths.
pub(crate) const SINGLES: [(&str, usize); 3] = [("D4", 24), ("D14", 32), ("D79", 40)];
/// A two-chain hub made of `D4` copies with free C termini.
pub(crate) const HUB_C: &str = "D4_C2_N";
/// A two-chain hub made of `D14` copies with free N termini.
pub(crate) const HUB_N: &str = "D14_C2_C";
/// A two-chain hub made of `D4` copies: chain A is free at both ends, chain B at its C end.
pub(crate) const HUB_BYPASS: &str = "D4_C2_B";

/// CA-CA distance of consecutive residues on the ideal helix.
pub(crate) fn helix_ca_step() -> f64 {
    let chord = 2.0 * HELIX_RADIUS * (HELIX_TWIST_DEG.to_radians() / 2.0).sin();
    (chord * chord + HELIX_RISE * HELIX_RISE).sqrt()
}

fn cylindrical(radius: f64, angle: f64, z: f64) -> Point3<f64> {
    Point3::new(radius * angle.cos(), radius * angle.sin(), z)
}

/// The residue at position `index` of the ideal helix, with residue number `number`.
pub(crate) fn helix_residue(index: isize, number: isize) -> DetachedResidue {
    let theta = (index as f64) * HELIX_TWIST_DEG.to_radians();
    let z = index as f64 * HELIX_RISE;
    let name = RESIDUE_NAMES[index.rem_euclid(4) as usize];
    let offset = 25f64.to_radians();
    let mut atoms = vec![
        Atom::new("N", cylindrical(1.6, theta - offset, z - 0.8)),
        Atom::new("CA", cylindrical(HELIX_RADIUS, theta, z)),
        Atom::new("C", cylindrical(1.7, theta + offset, z + 0.8)),
        Atom::new("O", cylindrical(1.9, theta + 1.5 * offset, z + 2.0)),
        Atom::new("CB", cylindrical(3.4, theta, z - 0.4)),
    ];
    if name == "LYS" {
        atoms.push(Atom::new("NZ", cylindrical(5.2, theta, z - 0.2)));
    }
    DetachedResidue::with_atoms(number, name, atoms)
}

/// `len` consecutive helix residues starting at helix position `start`, numbered from 1.
pub(crate) fn helix_segment(start: isize, len: usize) -> Vec<DetachedResidue> {
    (0..len as isize)
        .map(|i| helix_residue(start + i, i + 1))
        .collect()
}

pub(crate) fn structure_of(chains: Vec<(&str, Vec<DetachedResidue>)>) -> Structure {
    let mut structure = Structure::new();
    for (label, residues) in chains {
        structure.append_residues(label, residues);
    }
    structure
}

pub(crate) fn random_motion(rng: &mut StdRng) -> RigidTransform {
    let rotation = Rotation3::from_euler_angles(
        rng.gen_range(-3.1..3.1),
        rng.gen_range(-1.5..1.5),
        rng.gen_range(-3.1..3.1),
    )
    .into_inner();
    let translation = Vector3::new(
        rng.gen_range(-40.0..40.0),
        rng.gen_range(-40.0..40.0),
        rng.gen_range(-40.0..40.0),
    );
    RigidTransform::new(rotation, translation)
}

fn moved(mut structure: Structure, motion: &RigidTransform) -> Structure {
    structure.transform(motion);
    structure
}

pub(crate) fn single_len(name: &str) -> usize {
    SINGLES
        .iter()
        .find(|(single, _)| *single == name)
        .map(|(_, len)| *len)
        .unwrap()
}

/// Paths of a synthetic library written to disk.
pub(crate) struct LibraryPaths {
    pub library_dir: PathBuf,
    pub hub_info_path: PathBuf,
    pub cappings_dir: PathBuf,
    pub metadata_dir: PathBuf,
}

/// Writes singles, every ordered double, three hubs, caps and metadata under `root`.
///
/// Every file is placed under an independent random rigid motion.
pub(crate) fn write_library(root: &Path, seed: u64) -> LibraryPaths {
    let mut rng = StdRng::seed_from_u64(seed);
    let library_dir = root.join("library");
    let cappings_dir = root.join("cappings");
    let metadata_dir = root.join("metadata");
    for dir in [
        library_dir.join("singles"),
        library_dir.join("doubles"),
        library_dir.join("hubs"),
        cappings_dir.clone(),
        metadata_dir.clone(),
    ] {
        fs::create_dir_all(dir).unwrap();
    }

    for (name, len) in SINGLES {
        let single = structure_of(vec![("A", helix_segment(0, len))]);
        let path = library_dir.join("singles").join(format!("{}.pdb", name));
        write_structure(&moved(single, &random_motion(&mut rng)), &path).unwrap();
    }

    for (a, len_a) in SINGLES {
        for (b, len_b) in SINGLES {
            let double = structure_of(vec![("A", helix_segment(0, len_a + len_b))]);
            let path = library_dir
                .join("doubles")
                .join(format!("{}-{}.pdb", a, b));
            write_structure(&moved(double, &random_motion(&mut rng)), &path).unwrap();
        }
    }

    let mut hub_info = HubInfoTable::default();
    let hubs = [
        (HUB_C, "D4", [(false, true), (false, true)]),
        (HUB_N, "D14", [(true, false), (true, false)]),
        (HUB_BYPASS, "D4", [(true, true), (false, true)]),
    ];
    for (hub, single, free) in hubs {
        let len = single_len(single);
        let mut structure = Structure::new();
        let mut component_data = BTreeMap::new();
        for (chain, (n_free, c_free)) in ["A", "B"].into_iter().zip(free) {
            let mut residues = helix_segment(0, len);
            let motion = random_motion(&mut rng);
            for residue in &mut residues {
                residue.transform(&motion);
            }
            structure.append_residues(chain, residues);
            component_data.insert(
                chain.to_string(),
                ComponentInfo {
                    single_name: single.to_string(),
                    n_free,
                    c_free,
                },
            );
        }
        let path = library_dir.join("hubs").join(format!("{}.pdb", hub));
        write_structure(&structure, &path).unwrap();
        hub_info.insert(
            hub,
            HubInfo {
                oligomer_type: "C2".into(),
                symmetric: true,
                component_data,
            },
        );
    }
    let hub_info_path = root.join("hub_info.json");
    hub_info.save(&hub_info_path).unwrap();

    let mut repeat_rows = String::new();
    for (name, len) in SINGLES {
        let extension = CAP_EXTENSION as isize;
        let n_cap = structure_of(vec![(
            "A",
            helix_segment(-extension, CAP_EXTENSION + CAP_OVERLAP),
        )]);
        write_structure(
            &moved(n_cap, &random_motion(&mut rng)),
            &cappings_dir.join(format!("{}_NI.pdb", name)),
        )
        .unwrap();

        let c_cap = structure_of(vec![(
            "A",
            helix_segment((len - CAP_OVERLAP) as isize, CAP_OVERLAP + CAP_EXTENSION),
        )]);
        write_structure(
            &moved(c_cap, &random_motion(&mut rng)),
            &cappings_dir.join(format!("{}_IC.pdb", name)),
        )
        .unwrap();

        // N caps match from residue 5, C caps up to residue 8.
        repeat_rows.push_str(&format!(
            "DHR{}.pdb {} 6 7 {}\n",
            name.trim_start_matches('D'),
            CAP_EXTENSION + 1,
            CAP_OVERLAP
        ));
    }
    fs::write(metadata_dir.join(REPEAT_INDEX_FILE), repeat_rows).unwrap();

    LibraryPaths {
        library_dir,
        hub_info_path,
        cappings_dir,
        metadata_dir,
    }
}

/// Largest deviation of consecutive CA distances from the ideal helix step.
pub(crate) fn max_ca_step_error(cas: &[Point3<f64>]) -> f64 {
    let step = helix_ca_step();
    cas.windows(2)
        .map(|pair| ((pair[1] - pair[0]).norm() - step).abs())
        .fold(0.0, f64::max)
}
