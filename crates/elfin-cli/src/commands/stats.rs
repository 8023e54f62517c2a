use crate::cli::StatsArgs;
use crate::data::{DataManager, Resource};
use crate::error::Result;
use elfin::core::database::xdb::AlignmentDatabase;
use elfin::engine::error::EngineError;
use elfin::workflows::stats::{self, DatabaseStats, Summary};
use tracing::info;

pub fn run(args: StatsArgs) -> Result<()> {
    let xdb_path = match args.xdb {
        Some(path) => path,
        None => DataManager::new()?.resolve(Resource::Database),
    };
    info!("Loading alignment database from {:?}", &xdb_path);
    let db = AlignmentDatabase::load(&xdb_path).map_err(EngineError::from)?;

    print!("{}", render(&stats::run(&db)));

    if let Some(csv_path) = args.csv {
        let rows = stats::export_transforms_csv(&db, &csv_path)?;
        println!("✓ {} transform(s) exported to {}", rows, csv_path.display());
    }
    Ok(())
}

fn summary_line(label: &str, summary: Option<Summary>) -> String {
    match summary {
        Some(s) => format!(
            "  {:<22} min {:>8.3}  avg {:>8.3}  max {:>8.3}\n",
            label, s.min, s.avg, s.max
        ),
        None => format!("  {:<22} n/a\n", label),
    }
}

fn render(stats: &DatabaseStats) -> String {
    let mut out = format!(
        "Modules: {} singles, {} hubs\nTransforms: {}\n",
        stats.singles, stats.hubs, stats.transforms
    );
    out.push_str("Radii:\n");
    out.push_str(&summary_line("average (all atoms)", stats.radii.map(|r| r.average_all)));
    out.push_str(&summary_line("max CA distance", stats.radii.map(|r| r.max_ca_dist)));
    out.push_str(&summary_line("max heavy distance", stats.radii.map(|r| r.max_heavy_dist)));
    out.push_str("Translations:\n");
    out.push_str(&summary_line("length", stats.translation_length));
    out.push_str("Adjacency:\n");
    for (a, b) in &stats.adjacency {
        out.push_str(&format!("  {} -> {}\n", a, b));
    }
    out
}
