use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two kinds of module that can appear in a design.
///
/// Doubles only exist while the database is built and never reach a design graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Single,
    Hub,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Single => write!(f, "single"),
            ModuleKind::Hub => write!(f, "hub"),
        }
    }
}

impl FromStr for ModuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(ModuleKind::Single),
            "hub" => Ok(ModuleKind::Hub),
            other => Err(format!("unknown module kind '{}'", other)),
        }
    }
}

/// One end of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminus {
    N,
    C,
}

impl Terminus {
    pub fn opposite(self) -> Self {
        match self {
            Terminus::N => Terminus::C,
            Terminus::C => Terminus::N,
        }
    }
}

impl fmt::Display for Terminus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminus::N => write!(f, "n"),
            Terminus::C => write!(f, "c"),
        }
    }
}
