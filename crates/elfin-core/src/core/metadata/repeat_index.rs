use super::MetadataError;
use std::collections::HashMap;
use std::path::Path;

/// File name of the table inside the metadata directory.
pub const REPEAT_INDEX_FILE: &str = "repeat_indicies.csv";

/// Boundary residue numbers of a capping module: `[i0, i1, i2, i3]`.
///
/// `i0` marks where the N cap starts overlapping its single, `i3` where the C cap does.
pub type RepeatIndices = [isize; 4];

/// Per-module capping repeat indices, keyed by normalized module name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatIndexTable {
    entries: HashMap<String, RepeatIndices>,
}

/// Strips the file extension and maps `DHR` prefixes onto the library's `D` naming.
pub fn normalize_cap_name(raw: &str) -> String {
    let stem = raw.split('.').next().unwrap_or(raw);
    stem.replace("DHR", "D")
}

impl RepeatIndexTable {
    /// Loads the whitespace-delimited table (`<name>.pdb i0 i1 i2 i3`, no header).
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let csv_err = |e| MetadataError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b' ')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let mut entries = HashMap::new();
        for (record_num, result) in reader.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
            if fields.is_empty() {
                continue;
            }
            let malformed = |reason: String| MetadataError::Malformed {
                path: path.to_string_lossy().to_string(),
                record: record_num + 1,
                reason,
            };
            if fields.len() != 5 {
                return Err(malformed(format!(
                    "expected a name and 4 indices, found {} fields",
                    fields.len()
                )));
            }

            let mut indices = [0isize; 4];
            for (slot, value) in indices.iter_mut().zip(&fields[1..]) {
                *slot = value
                    .parse()
                    .map_err(|_| malformed(format!("invalid index '{}'", value)))?;
            }
            entries.insert(normalize_cap_name(fields[0]), indices);
        }
        Ok(Self { entries })
    }

    pub fn load_from_dir(metadata_dir: &Path) -> Result<Self, MetadataError> {
        Self::load(&metadata_dir.join(REPEAT_INDEX_FILE))
    }

    pub fn get(&self, name: &str) -> Option<&RepeatIndices> {
        self.entries.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&RepeatIndices, MetadataError> {
        self.get(name)
            .ok_or_else(|| MetadataError::MissingCapIndex(name.to_string()))
    }

    pub fn insert(&mut self, name: &str, indices: RepeatIndices) {
        self.entries.insert(name.to_string(), indices);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
