// src/utils/capability.rs: version and data gated pipeline features

use std::io;
use std::path::{Path, PathBuf};
use log::debug;

use crate::config::defs::{Database, DATABASE_FRAGMENTS, TAXONOMY_DATA_DIR};
use crate::utils::file::list_dir_files;
use crate::utils::version::SemVer;

/// Features a pipeline installation may or may not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityFlag {
    PseudoPooling,
    Database(Database),
}

impl CapabilityFlag {
    pub fn all() -> Vec<CapabilityFlag> {
        let mut flags = vec![CapabilityFlag::PseudoPooling];
        flags.extend(Database::ALL.iter().map(|db| CapabilityFlag::Database(*db)));
        flags
    }

    /// The requirement row for this flag.
    pub fn requirement(&self) -> Requirement {
        match self {
            CapabilityFlag::PseudoPooling => Requirement {
                min_version: Some(SemVer::new(1, 8, 0)),
                data_dir: None,
                fragments: &[],
            },
            CapabilityFlag::Database(db) => Requirement {
                min_version: None,
                data_dir: Some(PathBuf::from(TAXONOMY_DATA_DIR).join(db.code())),
                fragments: DATABASE_FRAGMENTS.get(db).copied().unwrap_or(&[]),
            },
        }
    }
}

impl std::fmt::Display for CapabilityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityFlag::PseudoPooling => write!(f, "pseudo-pooling"),
            CapabilityFlag::Database(db) => write!(f, "{} database", db.display_name()),
        }
    }
}


/// One row of the capability table. Every populated field must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub min_version: Option<SemVer>,
    /// Data directory relative to the installation path.
    pub data_dir: Option<PathBuf>,
    pub fragments: &'static [&'static str],
}


/// Lists file names inside an installation's data directories.
pub trait DataProbe {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Reads the directory from disk; subdirectories are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDataProbe;

impl DataProbe for FsDataProbe {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        list_dir_files(dir)
    }
}


/// Evaluates `flag` for an installation of `version` rooted at `install_path`.
pub fn evaluate(flag: CapabilityFlag, version: &SemVer, install_path: &Path, probe: &dyn DataProbe) -> bool {
    let requirement = flag.requirement();

    if let Some(min_version) = requirement.min_version {
        if *version < min_version {
            return false;
        }
    }

    if let Some(data_dir) = requirement.data_dir {
        let dir = install_path.join(data_dir);
        let files = match probe.list_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                debug!("{} unavailable for {}: cannot list {}: {}", flag, version, dir.display(), e);
                return false;
            }
        };
        let missing = requirement
            .fragments
            .iter()
            .find(|fragment| !files.iter().any(|name| name.contains(*fragment)));
        if let Some(fragment) = missing {
            debug!("{} unavailable for {}: no file matching '{}' in {}", flag, version, fragment, dir.display());
            return false;
        }
    }

    true
}
