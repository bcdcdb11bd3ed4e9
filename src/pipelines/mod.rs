pub mod selection;
pub mod filtering;
pub mod denoising;
pub mod taxonomy;
pub mod phylotree;
pub mod tracker;

use std::path::{Path, PathBuf};
use log::{error, info};

use crate::config::defs::{PipelineError, RunConfig, Stage, QSUB_TAG};
use crate::utils::command::{build, run_command, CommandSpec};
use crate::utils::file::absolute_from;

pub use denoising::DenoisingConfig;
pub use filtering::FilteringConfig;
pub use phylotree::PhyloTreeConfig;
pub use selection::SelectionConfig;
pub use taxonomy::TaxonomyConfig;
pub use tracker::TrackerConfig;

/// Options of one stage, ready to be validated and turned into a command.
#[derive(Debug, Clone, PartialEq)]
pub enum StageConfig {
    Selection(SelectionConfig),
    Filtering(FilteringConfig),
    Denoising(DenoisingConfig),
    Taxonomy(TaxonomyConfig),
    PhyloTree(PhyloTreeConfig),
    Tracker(TrackerConfig),
}

impl StageConfig {
    pub fn stage(&self) -> Stage {
        match self {
            StageConfig::Selection(_) => Stage::Selection,
            StageConfig::Filtering(_) => Stage::Filtering,
            StageConfig::Denoising(_) => Stage::Denoising,
            StageConfig::Taxonomy(_) => Stage::Taxonomy,
            StageConfig::PhyloTree(_) => Stage::PhyloTree,
            StageConfig::Tracker(_) => Stage::Tracker,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        match self {
            StageConfig::Selection(c) => c.validate(),
            StageConfig::Filtering(c) => c.validate(),
            StageConfig::Denoising(c) => c.validate(),
            StageConfig::Taxonomy(c) => c.validate(),
            StageConfig::PhyloTree(c) => c.validate(),
            StageConfig::Tracker(c) => c.validate(),
        }
    }
}


/// Fails with `PipelineError::Validation` naming `what` when `field` is empty.
pub(crate) fn require<'a, T>(field: &'a Option<T>, what: &str) -> Result<&'a T, PipelineError> {
    field
        .as_ref()
        .ok_or_else(|| PipelineError::Validation(format!("{} missing!", what)))
}

/// Like `require`, for counts that must be positive.
pub(crate) fn require_positive(field: Option<u32>, what: &str) -> Result<u32, PipelineError> {
    match field {
        Some(n) if n > 0 => Ok(n),
        Some(_) => Err(PipelineError::Validation(format!("{} must be a positive number!", what))),
        None => Err(PipelineError::Validation(format!("{} missing!", what))),
    }
}

pub(crate) fn optional_path(arg: &Option<String>, cwd: &Path) -> Option<PathBuf> {
    arg.as_ref()
        .filter(|s| !s.is_empty())
        .map(|s| absolute_from(Path::new(s), cwd))
}


fn script_name(stage: Stage) -> String {
    Path::new(stage.script().1)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Message logged once a stage's command returned successfully.
pub fn success_notice(stage: Stage) -> String {
    let script = script_name(stage);
    match stage {
        Stage::Tracker => format!("Script {} finished successfully", script),
        _ if stage.script().0 == QSUB_TAG => format!("{}: Upload to server successful", script),
        _ => format!("Execution of {} finished", script),
    }
}


/// Validates `config`, builds its command and runs it, or prints it on a dry run.
///
/// # Arguments
///
/// * `run_config` - RunConfig struct from main.
/// * `config` - Stage options.
///
/// # Returns
/// The command that was dispatched.
pub async fn dispatch(run_config: &RunConfig, config: &StageConfig) -> Result<CommandSpec, PipelineError> {
    let stage = config.stage();
    let spec = build(config, &run_config.version, &run_config.script_dir)?;
    info!("{} command: {}", stage.module_name(), spec);

    if run_config.args.dry_run {
        println!("{}", spec);
        return Ok(spec);
    }

    let script = script_name(stage);
    match run_command(&spec).await {
        Ok(()) => {
            info!("{}", success_notice(stage));
            Ok(spec)
        }
        Err(e) => {
            error!("Execution of {} failed", script);
            Err(e)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_notices() {
        assert_eq!(success_notice(Stage::Selection), "Execution of input.R finished");
        assert_eq!(success_notice(Stage::Filtering), "Execution of filtering.R finished");
        assert_eq!(success_notice(Stage::Tracker), "Script tracker.R finished successfully");
        assert_eq!(success_notice(Stage::Denoising), "qsub_inferenceBig_DADA2.sh: Upload to server successful");
        assert_eq!(success_notice(Stage::Taxonomy), "qsub_taxonomy_DADA2.sh: Upload to server successful");
        assert_eq!(success_notice(Stage::PhyloTree), "qsub_phylotree_DADA2.sh: Upload to server successful");
    }

    #[test]
    fn test_require_helpers() {
        assert!(matches!(require::<u32>(&None, "Output directory"), Err(PipelineError::Validation(_))));
        assert_eq!(require(&Some(3), "Plots").ok(), Some(&3));
        assert!(require_positive(Some(0), "Plots").is_err());
        assert_eq!(require_positive(Some(2), "Plots").ok(), Some(2));
        assert_eq!(optional_path(&Some(String::new()), Path::new("/cwd")), None);
        assert_eq!(optional_path(&Some("out".to_string()), Path::new("/cwd")), Some(PathBuf::from("/cwd/out")));
    }
}
