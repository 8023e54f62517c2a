use crate::error::{CliError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Well-known locations inside the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Relaxed module library (`singles/`, `doubles/`, `hubs/`).
    Library,
    /// Centred and aligned module files written by `build`.
    Aligned,
    /// The alignment database.
    Database,
    /// Cap structures (`<cap>_NI.pdb`, `<cap>_IC.pdb`).
    Cappings,
    /// Hub table and repeat-index table.
    Metadata,
    /// The JSON hub table inside the metadata directory.
    HubInfo,
}

impl Resource {
    fn relative_path(self) -> &'static str {
        match self {
            Resource::Library => "library",
            Resource::Aligned => "aligned",
            Resource::Database => "xdb.json",
            Resource::Cappings => "cappings",
            Resource::Metadata => "metadata",
            Resource::HubInfo => "metadata/hub_info.json",
        }
    }
}

#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    #[cfg(test)]
    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { base_path: path }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn resolve(&self, resource: Resource) -> PathBuf {
        self.base_path.join(resource.relative_path())
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let path_str = path.to_str().ok_or_else(|| {
            CliError::Data(format!("Data path is not valid UTF-8: {:?}", path))
        })?;
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path_str).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "elfin", "elfin")
    }

    fn get_path_config_file() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.config_dir().join("path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}
