use std::path::PathBuf;
use std::sync::Arc;

use crate::config::defs::{PipelineError, RunConfig};
use crate::pipelines::{dispatch, optional_path, require, StageConfig};

/// Phylogenetic tree of the denoised sequences (`qsub_phylotree_DADA2.sh`).
///
/// `input` is the FASTA of sequence variants written by taxonomy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhyloTreeConfig {
    pub input: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

impl PhyloTreeConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        require(&self.input, "Input FASTA file")?;
        require(&self.out_dir, "Output directory")?;
        Ok(())
    }

    pub fn from_args(run_config: &RunConfig) -> Self {
        PhyloTreeConfig {
            input: optional_path(&run_config.args.input, &run_config.cwd),
            out_dir: optional_path(&run_config.args.out_dir, &run_config.cwd),
        }
    }
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let config = PhyloTreeConfig::from_args(&run_config);
    dispatch(&run_config, &StageConfig::PhyloTree(config)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_input_and_out_dir() {
        let mut config = PhyloTreeConfig::default();
        assert!(matches!(config.validate(), Err(PipelineError::Validation(_))));
        config.input = Some(PathBuf::from("/data/taxonomy/seqs.fasta"));
        assert!(config.validate().is_err());
        config.out_dir = Some(PathBuf::from("/data/tree"));
        assert!(config.validate().is_ok());
    }
}
