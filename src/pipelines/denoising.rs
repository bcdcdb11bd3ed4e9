use std::path::PathBuf;
use std::sync::Arc;
use log::{debug, warn};

use crate::config::defs::{PipelineError, RunConfig, DEFAULT_POOLING};
use crate::pipelines::{dispatch, optional_path, require, require_positive, StageConfig};
use crate::utils::capability::CapabilityFlag;
use crate::utils::registry::{PipelineVersion, VersionRegistry};

/// Sample inference, merging and chimera removal (`qsub_inferenceBig_DADA2.sh`).
#[derive(Debug, Clone, PartialEq)]
pub struct DenoisingConfig {
    pub filtered_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub plots: Option<u32>,
    pooling: u32,
    pooling_enabled: bool,
    pub override_seqtab: bool,
    pub override_chimera: bool,
    pub concatenate: bool,
}

impl DenoisingConfig {
    /// Defaults for `version`; pooling is only settable where the
    /// installation supports pseudo-pooling.
    pub fn open(registry: &VersionRegistry, version: &PipelineVersion) -> Self {
        let pooling_enabled = registry.capability_of(version, CapabilityFlag::PseudoPooling);
        debug!("Pseudo-pooling {} for DADA2 {}", if pooling_enabled { "enabled" } else { "locked" }, version.id);
        DenoisingConfig {
            filtered_dir: None,
            out_dir: None,
            plots: None,
            pooling: DEFAULT_POOLING,
            pooling_enabled,
            override_seqtab: false,
            override_chimera: false,
            concatenate: false,
        }
    }

    pub fn pooling(&self) -> u32 {
        self.pooling
    }

    pub fn pooling_enabled(&self) -> bool {
        self.pooling_enabled
    }

    pub fn set_pooling(&mut self, pooling: u32) -> Result<(), PipelineError> {
        if !self.pooling_enabled && pooling != DEFAULT_POOLING {
            return Err(PipelineError::Validation(format!(
                "Pooling is not available for this DADA2 version (needs {} or newer)",
                CapabilityFlag::PseudoPooling.requirement().min_version.map(|v| v.to_string()).unwrap_or_default()
            )));
        }
        self.pooling = pooling;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        require(&self.filtered_dir, "Path to filtered fastq files")?;
        require(&self.out_dir, "Output directory")?;
        require_positive(self.plots, "Number of error plots")?;
        if !self.pooling_enabled && self.pooling != DEFAULT_POOLING {
            return Err(PipelineError::Validation("Pooling is locked for this DADA2 version".to_string()));
        }
        Ok(())
    }

    pub fn from_args(run_config: &RunConfig) -> Result<Self, PipelineError> {
        let args = &run_config.args;
        let mut config = DenoisingConfig::open(&run_config.registry, &run_config.version);
        config.filtered_dir = optional_path(&args.filtered_dir, &run_config.cwd);
        config.out_dir = optional_path(&args.out_dir, &run_config.cwd);
        config.plots = Some(args.plots);
        config.override_seqtab = args.override_seqtab;
        config.override_chimera = args.override_chimera;
        config.concatenate = args.concat;
        if let Some(pool) = args.pool {
            config.set_pooling(pool)?;
        }
        Ok(config)
    }
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let config = DenoisingConfig::from_args(&run_config)?;
    if config.concatenate {
        warn!("Concatenating reads instead of merging; overlap is ignored");
    }
    dispatch(&run_config, &StageConfig::Denoising(config)).await?;
    Ok(())
}
