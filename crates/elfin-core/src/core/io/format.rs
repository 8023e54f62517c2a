use super::cif::{CifError, CifFile};
use super::pdb::{PdbError, PdbFile};
use super::traits::MolecularFile;
use crate::core::models::structure::Structure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// On-disk structure formats understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    Pdb,
    #[default]
    Cif,
}

impl StructureFormat {
    /// Infers the format from a file extension (`.pdb`/`.ent`, `.cif`/`.mmcif`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdb" | "ent" => Some(Self::Pdb),
            "cif" | "mmcif" => Some(Self::Cif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdb => "pdb",
            Self::Cif => "cif",
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StructureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdb" | "ent" => Ok(Self::Pdb),
            "cif" | "mmcif" => Ok(Self::Cif),
            other => Err(format!("unknown structure format '{}'", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum StructureFileError {
    #[error("Unsupported structure format for '{path}'")]
    UnsupportedFormat { path: PathBuf },
    #[error("PDB error in '{path}': {source}")]
    Pdb {
        path: PathBuf,
        #[source]
        source: PdbError,
    },
    #[error("mmCIF error in '{path}': {source}")]
    Cif {
        path: PathBuf,
        #[source]
        source: CifError,
    },
}

/// Reads a structure, choosing the parser from the file extension.
pub fn read_structure(path: &Path) -> Result<Structure, StructureFileError> {
    match StructureFormat::from_path(path) {
        Some(StructureFormat::Pdb) => PdbFile::read_from_path(path)
            .map(|(structure, _)| structure)
            .map_err(|source| StructureFileError::Pdb {
                path: path.to_path_buf(),
                source,
            }),
        Some(StructureFormat::Cif) => CifFile::read_from_path(path)
            .map(|(structure, _)| structure)
            .map_err(|source| StructureFileError::Cif {
                path: path.to_path_buf(),
                source,
            }),
        None => Err(StructureFileError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Writes a structure, choosing the writer from the file extension.
pub fn write_structure(structure: &Structure, path: &Path) -> Result<(), StructureFileError> {
    let format =
        StructureFormat::from_path(path).ok_or_else(|| StructureFileError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
    write_structure_as(structure, path, format)
}

/// Writes a structure in an explicit format, regardless of the path's extension.
pub fn write_structure_as(
    structure: &Structure,
    path: &Path,
    format: StructureFormat,
) -> Result<(), StructureFileError> {
    match format {
        StructureFormat::Pdb => {
            PdbFile::write_structure_to_path(structure, path).map_err(|source| {
                StructureFileError::Pdb {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
        StructureFormat::Cif => {
            CifFile::write_structure_to_path(structure, path).map_err(|source| {
                StructureFileError::Cif {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
    }
}
