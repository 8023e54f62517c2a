use super::MetadataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub single_name: String,
    pub n_free: bool,
    pub c_free: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInfo {
    pub oligomer_type: String,
    pub symmetric: bool,
    pub component_data: BTreeMap<String, ComponentInfo>,
}

/// The `hub_info.json` table, keyed by hub name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubInfoTable {
    hubs: BTreeMap<String, HubInfo>,
}

impl HubInfoTable {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path).map_err(|e| MetadataError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| MetadataError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), MetadataError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| MetadataError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        fs::write(path, content).map_err(|e| MetadataError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Converts the CSV form of the table.
    ///
    /// Records come in pairs: a hub row `file.pdb, oligomer, symmetric|asymmetric,
    /// N_free|-, C_free|-` followed by a component row `chain, single, chain, single, ...`.
    pub fn from_csv(path: &Path) -> Result<Self, MetadataError> {
        let csv_err = |e| MetadataError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_err)?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            records.push(record);
        }

        let malformed = |record: usize, reason: &str| MetadataError::Malformed {
            path: path.to_string_lossy().to_string(),
            record,
            reason: reason.to_string(),
        };
        if records.len() % 2 != 0 {
            return Err(malformed(records.len(), "hub row without a component row"));
        }

        let mut table = Self::default();
        for (pair, rows) in records.chunks(2).enumerate() {
            let (hub_row, chain_row) = (&rows[0], &rows[1]);
            if hub_row.len() < 5 {
                return Err(malformed(2 * pair + 1, "hub row needs five fields"));
            }
            if chain_row.len() % 2 != 0 {
                return Err(malformed(2 * pair + 2, "component row needs chain/single pairs"));
            }

            let n_free = &hub_row[3] == "N_free";
            let c_free = &hub_row[4] == "C_free";
            let component_data = chain_row
                .iter()
                .collect::<Vec<_>>()
                .chunks(2)
                .map(|pair| {
                    (
                        pair[0].to_string(),
                        ComponentInfo {
                            single_name: pair[1].to_string(),
                            n_free,
                            c_free,
                        },
                    )
                })
                .collect();

            let name = hub_row[0].trim_end_matches(".pdb").to_string();
            table.hubs.insert(
                name,
                HubInfo {
                    oligomer_type: hub_row[1].to_string(),
                    symmetric: &hub_row[2] == "symmetric",
                    component_data,
                },
            );
        }
        Ok(table)
    }

    pub fn get(&self, hub: &str) -> Option<&HubInfo> {
        self.hubs.get(hub)
    }

    pub fn require(&self, hub: &str) -> Result<&HubInfo, MetadataError> {
        self.get(hub)
            .ok_or_else(|| MetadataError::MissingHubMetadata(hub.to_string()))
    }

    pub fn insert(&mut self, hub: &str, info: HubInfo) {
        self.hubs.insert(hub.to_string(), info);
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HubInfo)> {
        self.hubs.iter().map(|(name, info)| (name.as_str(), info))
    }
}
