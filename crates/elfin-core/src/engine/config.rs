use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Inputs and outputs of one database build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Relaxed module library with `singles/`, `doubles/` and `hubs/` subdirectories.
    pub library_dir: PathBuf,
    pub hub_info_path: PathBuf,
    /// Receives the centred and aligned modules, mirroring the library layout.
    pub aligned_dir: PathBuf,
    pub output_path: PathBuf,
}

impl BuildConfig {
    pub fn singles_dir(&self) -> PathBuf {
        self.library_dir.join("singles")
    }

    pub fn doubles_dir(&self) -> PathBuf {
        self.library_dir.join("doubles")
    }

    pub fn hubs_dir(&self) -> PathBuf {
        self.library_dir.join("hubs")
    }

    pub fn aligned_path(&self, category: &str, name: &str) -> PathBuf {
        self.aligned_dir.join(category).join(format!("{}.pdb", name))
    }
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    library_dir: Option<PathBuf>,
    hub_info_path: Option<PathBuf>,
    aligned_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library_dir(mut self, path: PathBuf) -> Self {
        self.library_dir = Some(path);
        self
    }
    pub fn hub_info_path(mut self, path: PathBuf) -> Self {
        self.hub_info_path = Some(path);
        self
    }
    pub fn aligned_dir(mut self, path: PathBuf) -> Self {
        self.aligned_dir = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    pub fn build(self) -> Result<BuildConfig, ConfigError> {
        Ok(BuildConfig {
            library_dir: self
                .library_dir
                .ok_or(ConfigError::MissingParameter("library_dir"))?,
            hub_info_path: self
                .hub_info_path
                .ok_or(ConfigError::MissingParameter("hub_info_path"))?,
            aligned_dir: self
                .aligned_dir
                .ok_or(ConfigError::MissingParameter("aligned_dir"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
        })
    }
}

/// Where capping references live.
#[derive(Debug, Clone, PartialEq)]
pub struct CappingConfig {
    pub cappings_dir: PathBuf,
    /// Directory holding `repeat_indicies.csv`.
    pub metadata_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StitchConfig {
    /// Output of the database build: `singles/`, `doubles/` and `hubs/` aligned modules.
    pub aligned_dir: PathBuf,
    /// `None` when capping is disabled.
    pub capping: Option<CappingConfig>,
    pub skip_unused: bool,
}

impl StitchConfig {
    pub fn capping_enabled(&self) -> bool {
        self.capping.is_some()
    }

    pub fn single_path(&self, name: &str) -> PathBuf {
        module_path(&self.aligned_dir, "singles", name)
    }

    pub fn double_path(&self, a: &str, b: &str) -> PathBuf {
        module_path(&self.aligned_dir, "doubles", &format!("{}-{}", a, b))
    }

    pub fn hub_path(&self, name: &str) -> PathBuf {
        module_path(&self.aligned_dir, "hubs", name)
    }
}

fn module_path(root: &Path, category: &str, name: &str) -> PathBuf {
    root.join(category).join(format!("{}.pdb", name))
}

#[derive(Default)]
pub struct StitchConfigBuilder {
    aligned_dir: Option<PathBuf>,
    cappings_dir: Option<PathBuf>,
    metadata_dir: Option<PathBuf>,
    disable_capping: bool,
    skip_unused: bool,
}

impl StitchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aligned_dir(mut self, path: PathBuf) -> Self {
        self.aligned_dir = Some(path);
        self
    }
    pub fn cappings_dir(mut self, path: PathBuf) -> Self {
        self.cappings_dir = Some(path);
        self
    }
    pub fn metadata_dir(mut self, path: PathBuf) -> Self {
        self.metadata_dir = Some(path);
        self
    }
    pub fn disable_capping(mut self, disable: bool) -> Self {
        self.disable_capping = disable;
        self
    }
    pub fn skip_unused(mut self, skip: bool) -> Self {
        self.skip_unused = skip;
        self
    }

    /// Capping directories are only required while capping is enabled.
    pub fn build(self) -> Result<StitchConfig, ConfigError> {
        let capping = if self.disable_capping {
            None
        } else {
            Some(CappingConfig {
                cappings_dir: self
                    .cappings_dir
                    .ok_or(ConfigError::MissingParameter("cappings_dir"))?,
                metadata_dir: self
                    .metadata_dir
                    .ok_or(ConfigError::MissingParameter("metadata_dir"))?,
            })
        };
        Ok(StitchConfig {
            aligned_dir: self
                .aligned_dir
                .ok_or(ConfigError::MissingParameter("aligned_dir"))?,
            capping,
            skip_unused: self.skip_unused,
        })
    }
}
