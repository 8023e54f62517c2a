use crate::cli::{BuildArgs, StitchArgs};
use crate::data::{DataManager, Resource};
use crate::error::{CliError, Result};
use elfin::core::io::format::StructureFormat;
use elfin::engine::config as core_config;
use elfin::workflows::stitch::StitchOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBuildConfig {
    library_dir: Option<PathBuf>,
    hub_info: Option<PathBuf>,
    aligned_dir: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStitchConfig {
    xdb: Option<PathBuf>,
    aligned_dir: Option<PathBuf>,
    cappings_dir: Option<PathBuf>,
    metadata_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    format: Option<StructureFormat>,
    disable_capping: Option<bool>,
    skip_unused: Option<bool>,
    place_from: Option<String>,
}

impl PartialBuildConfig {
    /// Returns `false` for an unknown field.
    fn set(&mut self, field: &str, value: &str) -> Result<bool> {
        let slot = match field {
            "library-dir" => &mut self.library_dir,
            "hub-info" => &mut self.hub_info,
            "aligned-dir" => &mut self.aligned_dir,
            "output" => &mut self.output,
            _ => return Ok(false),
        };
        *slot = Some(PathBuf::from(value));
        Ok(true)
    }
}

impl PartialStitchConfig {
    /// Returns `false` for an unknown field.
    fn set(&mut self, field: &str, value: &str) -> Result<bool> {
        let key = format!("stitch.{}", field);
        match field {
            "xdb" => self.xdb = Some(value.into()),
            "aligned-dir" => self.aligned_dir = Some(value.into()),
            "cappings-dir" => self.cappings_dir = Some(value.into()),
            "metadata-dir" => self.metadata_dir = Some(value.into()),
            "out-dir" => self.out_dir = Some(value.into()),
            "place-from" => self.place_from = Some(value.into()),
            "format" => self.format = Some(parse_value(&key, value)?),
            "disable-capping" => self.disable_capping = Some(parse_value(&key, value)?),
            "skip-unused" => self.skip_unused = Some(parse_value(&key, value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Configuration file contents; every field may be overridden from the command line.
///
/// ```toml
/// [build]
/// library-dir = "/data/library"
///
/// [stitch]
/// format = "pdb"
/// skip-unused = true
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    build: Option<PartialBuildConfig>,
    stitch: Option<PartialStitchConfig>,
}

/// Everything the stitch command needs after merging.
#[derive(Debug, Clone)]
pub struct StitchSettings {
    pub xdb_path: PathBuf,
    pub config: core_config::StitchConfig,
    pub options: StitchOptions,
    pub out_dir: Option<PathBuf>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn merge_build(
        mut self,
        args: &BuildArgs,
        data_manager: &DataManager,
    ) -> Result<core_config::BuildConfig> {
        self.apply_set_values(&args.set_values)?;
        let file = self.build.take().unwrap_or_default();

        let pick = |cli: &Option<PathBuf>, file: Option<PathBuf>, resource: Resource| {
            cli.clone()
                .or(file)
                .unwrap_or_else(|| data_manager.resolve(resource))
        };

        core_config::BuildConfigBuilder::new()
            .library_dir(pick(&args.library_dir, file.library_dir, Resource::Library))
            .hub_info_path(pick(&args.hub_info, file.hub_info, Resource::HubInfo))
            .aligned_dir(pick(&args.aligned_dir, file.aligned_dir, Resource::Aligned))
            .output_path(pick(&args.output, file.output, Resource::Database))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_stitch(
        mut self,
        args: &StitchArgs,
        data_manager: &DataManager,
    ) -> Result<StitchSettings> {
        self.apply_set_values(&args.set_values)?;
        let file = self.stitch.take().unwrap_or_default();

        let pick = |cli: &Option<PathBuf>, file: Option<PathBuf>, resource: Resource| {
            cli.clone()
                .or(file)
                .unwrap_or_else(|| data_manager.resolve(resource))
        };

        let config = core_config::StitchConfigBuilder::new()
            .aligned_dir(pick(&args.aligned_dir, file.aligned_dir, Resource::Aligned))
            .cappings_dir(pick(&args.cappings_dir, file.cappings_dir, Resource::Cappings))
            .metadata_dir(pick(&args.metadata_dir, file.metadata_dir, Resource::Metadata))
            .disable_capping(args.disable_capping || file.disable_capping.unwrap_or(false))
            .skip_unused(args.skip_unused || file.skip_unused.unwrap_or(false))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(StitchSettings {
            xdb_path: pick(&args.xdb, file.xdb, Resource::Database),
            config,
            options: StitchOptions {
                format: args.format.or(file.format).unwrap_or_default(),
                place_from: args.place_from.clone().or(file.place_from),
            },
            out_dir: args.out_dir.clone().or(file.out_dir),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            let known = match key.split_once('.') {
                Some(("build", field)) => self
                    .build
                    .get_or_insert_with(Default::default)
                    .set(field, value_str)?,
                Some(("stitch", field)) => self
                    .stitch
                    .get_or_insert_with(Default::default)
                    .set(field, value_str)?,
                _ => false,
            };
            if !known {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}
