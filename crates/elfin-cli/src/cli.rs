use clap::{Args, Parser, Subcommand};
use elfin::core::io::format::StructureFormat;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Elfin Developers",
    version,
    about = "elfin - builds junction geometry for modular protein building blocks and stitches design graphs into atomic models.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the alignment database from a relaxed module library.
    Build(BuildArgs),
    /// Assemble design files into atomic models.
    Stitch(StitchArgs),
    /// Summarize an alignment database.
    Stats(StatsArgs),
    /// Convert a CSV hub table into the JSON form used by `build`.
    Hubinfo(HubInfoArgs),
    /// Manage the local data directory (library, database, caps, metadata).
    Data(DataArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Relaxed module library with `singles/`, `doubles/` and `hubs/` subdirectories.
    #[arg(short, long = "library", value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    /// Hub metadata table (`hub_info.json`).
    #[arg(long = "hub-info", value_name = "PATH")]
    pub hub_info: Option<PathBuf>,

    /// Directory receiving the centred and aligned module files.
    #[arg(short, long, value_name = "DIR")]
    pub aligned_dir: Option<PathBuf>,

    /// Path of the database to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S build.aligned-dir=/tmp/aligned
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `stitch` subcommand.
#[derive(Args, Debug)]
pub struct StitchArgs {
    /// Design files to assemble.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Alignment database to read.
    #[arg(short = 'x', long, value_name = "PATH")]
    pub xdb: Option<PathBuf>,

    /// Directory holding the aligned module files written by `build`.
    #[arg(short, long, value_name = "DIR")]
    pub aligned_dir: Option<PathBuf>,

    /// Directory holding the cap structures.
    #[arg(long, value_name = "DIR")]
    pub cappings_dir: Option<PathBuf>,

    /// Directory holding the repeat-index table.
    #[arg(long, value_name = "DIR")]
    pub metadata_dir: Option<PathBuf>,

    /// Write outputs here instead of next to each input.
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output structure format.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<StructureFormat>,

    /// Leave free termini uncapped.
    #[arg(long)]
    pub disable_capping: bool,

    /// Drop unconnected hub components instead of emitting them as chains.
    #[arg(long)]
    pub skip_unused: bool,

    /// Recompute node placements from the database, starting at this node.
    #[arg(long, value_name = "NODE")]
    pub place_from: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S stitch.skip-unused=true
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Alignment database to summarize.
    #[arg(short = 'x', long, value_name = "PATH")]
    pub xdb: Option<PathBuf>,

    /// Export every transform to this CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// Arguments for the `hubinfo` subcommand.
#[derive(Args, Debug)]
pub struct HubInfoArgs {
    /// CSV hub table to convert.
    #[arg(required = true, value_name = "CSV")]
    pub input: PathBuf,

    /// Where to write the JSON table. Defaults to the data directory's metadata folder.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Show the absolute path to the local data directory.
    Path,
    /// Set a custom absolute path for the local data directory.
    SetPath {
        /// The new path to use for data files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the data path to its default, OS-specific location.
    ResetPath,
}
