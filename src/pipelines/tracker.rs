use std::path::PathBuf;
use std::sync::Arc;
use log::warn;

use crate::config::defs::{PipelineError, RunConfig};
use crate::pipelines::{dispatch, optional_path, require, StageConfig};

/// Per-sample read counts through every stage (`tracker.R`).
///
/// Takes the RData files written by filtering and denoising.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerConfig {
    pub filtering: Option<PathBuf>,
    pub dada: Option<PathBuf>,
    pub merged: Option<PathBuf>,
    pub seqtab_raw: Option<PathBuf>,
    pub seqtab_clean: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        require(&self.filtering, "Filtering RData file")?;
        require(&self.dada, "Denoised RData file")?;
        require(&self.merged, "Merged RData file")?;
        require(&self.seqtab_raw, "Sequence table RData file")?;
        require(&self.seqtab_clean, "Chimera-free sequence table RData file")?;
        require(&self.out_dir, "Output directory")?;
        Ok(())
    }

    pub fn from_args(run_config: &RunConfig) -> Self {
        let args = &run_config.args;
        let cwd = &run_config.cwd;
        TrackerConfig {
            filtering: optional_path(&args.filtering_rdata, cwd),
            dada: optional_path(&args.dada_rdata, cwd),
            merged: optional_path(&args.merged_rdata, cwd),
            seqtab_raw: optional_path(&args.seqtab_raw_rdata, cwd),
            seqtab_clean: optional_path(&args.seqtab_clean_rdata, cwd),
            out_dir: optional_path(&args.out_dir, cwd),
        }
    }
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let config = TrackerConfig::from_args(&run_config);
    for file in [&config.filtering, &config.dada, &config.merged, &config.seqtab_raw, &config.seqtab_clean]
        .into_iter()
        .flatten()
    {
        if !file.is_file() {
            warn!("{} does not exist yet", file.display());
        }
    }
    dispatch(&run_config, &StageConfig::Tracker(config)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_input_required() {
        let full = TrackerConfig {
            filtering: Some(PathBuf::from("/run/filtering.RData")),
            dada: Some(PathBuf::from("/run/dada.RData")),
            merged: Some(PathBuf::from("/run/merged.RData")),
            seqtab_raw: Some(PathBuf::from("/run/seqtab.RData")),
            seqtab_clean: Some(PathBuf::from("/run/seqtab_nochim.RData")),
            out_dir: Some(PathBuf::from("/run/tracker")),
        };
        assert!(full.validate().is_ok());

        let mut missing = full.clone();
        missing.merged = None;
        assert!(matches!(missing.validate(), Err(PipelineError::Validation(_))));

        let mut missing = full;
        missing.out_dir = None;
        assert!(missing.validate().is_err());
    }
}
