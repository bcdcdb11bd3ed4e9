use std::path::PathBuf;
use std::sync::Arc;
use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

use crate::cli::Arguments;
use crate::utils::registry::{PipelineVersion, VersionRegistry};

// External software
pub const RSCRIPT_TAG: &str = "Rscript";
pub const QSUB_TAG: &str = "qsub";
pub const DADA2_PACKAGE: &str = "dada2";

// Scripts, relative to the script directory
pub const INPUT_SCRIPT: &str = "input.R";
pub const FILTERING_SCRIPT: &str = "filtering.R";
pub const DENOISING_SCRIPT: &str = "specialApplications/qsub_inferenceBig_DADA2.sh";
pub const TAXONOMY_SCRIPT: &str = "qsub_taxonomy_DADA2.sh";
pub const PHYLOTREE_SCRIPT: &str = "qsub_phylotree_DADA2.sh";
pub const TRACKER_SCRIPT: &str = "tracker.R";

pub const DEFAULT_SCRIPT_DIR: &str = "/opt/dada2/scripts";
pub const DEFAULT_VERSIONS_FILE: &str = "/opt/dada2/package/versionsDADA2.txt";

// Static Filenames
pub const MANIFEST_FILENAME: &str = "inputPaths.txt";
pub const VERSIONS_HEADER: [&str; 3] = ["version", "path", "status"];

// Sample discovery
pub const FORWARD_MARKER: &str = "pair1.truncated";
pub const REVERSE_MARKER: &str = "pair2.truncated";
pub const SAMPLE_NAME_DELIMITER: char = '_';

// Static Parameters
pub const DEFAULT_PLOTS: u32 = 5;
pub const DEFAULT_TRUNC_LEFT: u32 = 0;
pub const DEFAULT_TRUNC_LEN: u32 = 300;
pub const DEFAULT_MIN_QUALITY: u32 = 2;
pub const DEFAULT_POOLING: u32 = 0;
pub const TAXONOMY_DATA_DIR: &str = "taxonomy";


/// Pipeline stages, in the order a run normally walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Selection,
    Filtering,
    Denoising,
    Taxonomy,
    PhyloTree,
    Tracker,
}

impl Stage {
    /// Executable and script for the stage.
    pub fn script(&self) -> (&'static str, &'static str) {
        match self {
            Stage::Selection => (RSCRIPT_TAG, INPUT_SCRIPT),
            Stage::Filtering => (RSCRIPT_TAG, FILTERING_SCRIPT),
            Stage::Denoising => (QSUB_TAG, DENOISING_SCRIPT),
            Stage::Taxonomy => (QSUB_TAG, TAXONOMY_SCRIPT),
            Stage::PhyloTree => (QSUB_TAG, PHYLOTREE_SCRIPT),
            Stage::Tracker => (RSCRIPT_TAG, TRACKER_SCRIPT),
        }
    }

    /// Whether the stage script receives the installation path.
    pub fn version_bound(&self) -> bool {
        !matches!(self, Stage::PhyloTree | Stage::Tracker)
    }

    pub fn module_name(&self) -> &'static str {
        match self {
            Stage::Selection => "select",
            Stage::Filtering => "filter",
            Stage::Denoising => "denoise",
            Stage::Taxonomy => "taxonomy",
            Stage::PhyloTree => "phylotree",
            Stage::Tracker => "tracker",
        }
    }
}


/// Reference databases offered for taxonomic assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Database {
    Silva,
    Rdp,
    GreenGenes,
    Unite,
}

impl Database {
    pub const ALL: [Database; 4] = [Database::Silva, Database::Rdp, Database::GreenGenes, Database::Unite];

    /// Value passed to the taxonomy script and the data subdirectory name.
    pub fn code(&self) -> &'static str {
        match self {
            Database::Silva => "silva",
            Database::Rdp => "rdp",
            Database::GreenGenes => "gg",
            Database::Unite => "unite",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Database::Silva => "SILVA",
            Database::Rdp => "RDP",
            Database::GreenGenes => "Green Genes",
            Database::Unite => "UNITE (ITS)",
        }
    }

    pub fn from_code(code: &str) -> Option<Database> {
        Database::ALL.iter().copied().find(|db| db.code().eq_ignore_ascii_case(code))
    }
}


lazy_static! {
    /// File name fragments each reference database must provide, every
    /// fragment matched by at least one file under `taxonomy/<code>/`.
    pub static ref DATABASE_FRAGMENTS: HashMap<Database, &'static [&'static str]> = {
        let mut m: HashMap<Database, &'static [&'static str]> = HashMap::new();
        m.insert(Database::Silva, &["train_set", "species_assignment"]);
        m.insert(Database::Rdp, &["train_set", "species"]);
        m.insert(Database::GreenGenes, &["train_set"]);
        m.insert(Database::Unite, &["general_release"]);
        m
    };
}


#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid versions file: {0}")]
    Config(String),

    #[error("No DADA2 installation found: {0}")]
    NoInstallation(String),

    #[error("R runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Selected DADA2 version not available: {0}")]
    UnknownVersion(String),

    #[error("Sample pairing failed: {0}")]
    Pairing(String),

    #[error("Data missing: {0}")]
    Validation(String),

    #[error("No reverse reads given; confirm single-end filtering to continue")]
    SingleEndUnconfirmed,

    #[error("No databases installed for DADA2 {0}")]
    NoDatabasesInstalled(String),

    #[error("Selection invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Tool execution failed for {tool}: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IOError(err.to_string())
    }
}


pub struct RunConfig {
    pub cwd: PathBuf,
    pub script_dir: PathBuf,
    pub registry: Arc<VersionRegistry>,
    pub version: PipelineVersion,
    pub args: Arguments,
}
