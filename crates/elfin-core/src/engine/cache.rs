use super::error::EngineError;
use crate::core::io::format::read_structure;
use crate::core::models::structure::Structure;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Structures loaded during one run, keyed by path.
///
/// Each module file is parsed at most once; callers clone residues out of the cached
/// structure rather than mutating it.
#[derive(Debug, Default, Clone)]
pub struct StructureCache {
    data: HashMap<PathBuf, Structure>,
}

impl StructureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the structure at `path`, loading it on first use.
    ///
    /// `kind` names the reference ("single", "double", "cap", ...) in the error raised
    /// when the file does not exist.
    pub fn get_or_load(&mut self, path: &Path, kind: &'static str) -> Result<&Structure, EngineError> {
        if !self.data.contains_key(path) {
            if !path.is_file() {
                return Err(EngineError::MissingReference {
                    kind,
                    path: path.to_string_lossy().to_string(),
                });
            }
            let structure = read_structure(path)?;
            self.data.insert(path.to_path_buf(), structure);
        }
        self.data
            .get(path)
            .ok_or_else(|| EngineError::Internal(format!("cache miss for {}", path.display())))
    }

    pub fn insert(&mut self, path: PathBuf, structure: Structure) {
        self.data.insert(path, structure);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.data.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
