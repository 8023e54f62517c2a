use crate::core::database::entries::{Radii, TransformId};
use crate::core::database::xdb::AlignmentDatabase;
use crate::engine::error::EngineError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, instrument};

/// Minimum, mean and maximum of a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl Summary {
    /// `None` for an empty set.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        (count > 0).then(|| Self {
            min,
            avg: sum / count as f64,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiiSummary {
    pub average_all: Summary,
    pub max_ca_dist: Summary,
    pub max_heavy_dist: Summary,
}

impl RadiiSummary {
    fn of(radii: &[Radii]) -> Option<Self> {
        Some(Self {
            average_all: Summary::of(radii.iter().map(|r| r.average_all))?,
            max_ca_dist: Summary::of(radii.iter().map(|r| r.max_ca_dist))?,
            max_heavy_dist: Summary::of(radii.iter().map(|r| r.max_heavy_dist))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    pub singles: usize,
    pub hubs: usize,
    pub transforms: usize,
    /// Over singles and hubs together.
    pub radii: Option<RadiiSummary>,
    pub translation_length: Option<Summary>,
    /// Distinct `(mod_a, mod_b)` pairs joined by at least one transform, sorted.
    pub adjacency: Vec<(String, String)>,
}

#[instrument(skip_all, name = "stats_workflow")]
pub fn run(db: &AlignmentDatabase) -> DatabaseStats {
    let radii: Vec<Radii> = db
        .modules
        .singles
        .values()
        .map(|single| single.radii)
        .chain(db.modules.hubs.values().map(|hub| hub.radii))
        .collect();

    let adjacency: BTreeSet<(String, String)> = db
        .n_to_c_tx
        .iter()
        .map(|tx| (tx.mod_a.clone(), tx.mod_b.clone()))
        .collect();

    let stats = DatabaseStats {
        singles: db.modules.singles.len(),
        hubs: db.modules.hubs.len(),
        transforms: db.n_to_c_tx.len(),
        radii: RadiiSummary::of(&radii),
        translation_length: Summary::of(db.n_to_c_tx.iter().map(|tx| tx.translation_length())),
        adjacency: adjacency.into_iter().collect(),
    };
    info!(
        singles = stats.singles,
        hubs = stats.hubs,
        transforms = stats.transforms,
        "Database summarized."
    );
    stats
}

#[derive(Debug, Serialize)]
struct TransformRecord<'a> {
    id: TransformId,
    mod_a: &'a str,
    mod_a_chain: &'a str,
    mod_b: &'a str,
    mod_b_chain: &'a str,
    translation_length: f64,
}

/// Writes one CSV row per transform. Returns the number of rows.
pub fn export_transforms_csv(db: &AlignmentDatabase, path: &Path) -> Result<usize, EngineError> {
    let csv_err = |source| EngineError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for (id, tx) in db.n_to_c_tx.iter().enumerate() {
        writer
            .serialize(TransformRecord {
                id,
                mod_a: &tx.mod_a,
                mod_a_chain: &tx.mod_a_chain,
                mod_b: &tx.mod_b,
                mod_b_chain: &tx.mod_b_chain,
                translation_length: tx.translation_length(),
            })
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| EngineError::io(path, e))?;
    Ok(db.n_to_c_tx.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::xdb::tests::sample_database;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn summary_of_nothing_is_none() {
        assert_eq!(Summary::of(Vec::new()), None);
        let summary = Summary::of([1.0, 4.0, 7.0]).unwrap();
        assert_eq!((summary.min, summary.avg, summary.max), (1.0, 4.0, 7.0));
    }

    #[test]
    fn database_is_summarized() {
        let stats = run(&sample_database());
        assert_eq!((stats.singles, stats.hubs, stats.transforms), (2, 1, 2));

        let radii = stats.radii.unwrap();
        assert_eq!(radii.max_ca_dist.max, 20.0);
        assert_eq!(radii.max_ca_dist.min, 0.0);

        let translation = stats.translation_length.unwrap();
        assert!((translation.max - 30.0).abs() < 1e-12);
        assert!(translation.min.abs() < 1e-12);

        assert_eq!(
            stats.adjacency,
            vec![
                ("D4".to_string(), "D14".to_string()),
                ("D4_C2_N".to_string(), "D14".to_string()),
            ]
        );
    }

    #[test]
    fn empty_database_has_no_summaries() {
        let stats = run(&AlignmentDatabase::new());
        assert!(stats.radii.is_none());
        assert!(stats.translation_length.is_none());
        assert!(stats.adjacency.is_empty());
    }

    #[test]
    fn transforms_are_exported_as_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transforms.csv");
        assert_eq!(export_transforms_csv(&sample_database(), &path).unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "id,mod_a,mod_a_chain,mod_b,mod_b_chain,translation_length"
        );
        assert_eq!(lines[1], "0,D4,A,D14,A,30.0");
        assert_eq!(lines.len(), 3);
    }
}
