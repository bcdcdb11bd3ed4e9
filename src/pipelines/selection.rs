use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use log::{debug, info};

use crate::config::defs::{PipelineError, RunConfig, MANIFEST_FILENAME};
use crate::pipelines::{dispatch, optional_path, require, require_positive, StageConfig};
use crate::utils::manifest::write_manifest;
use crate::utils::sample::{PairingMode, Sample, SampleMatcher};
use crate::utils::selection::SelectionSet;

/// Sample selection and quality plots (`input.R`).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub samples: Vec<Sample>,
    pub out_dir: Option<PathBuf>,
    pub plots: Option<u32>,
}

impl SelectionConfig {
    /// Takes the selected side of `set`, in manifest order.
    pub fn new(set: &SelectionSet, out_dir: Option<PathBuf>, plots: Option<u32>) -> Self {
        SelectionConfig {
            samples: set.snapshot_selected_ordered().into_iter().cloned().collect(),
            out_dir,
            plots,
        }
    }

    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.out_dir.as_ref().map(|dir| dir.join(MANIFEST_FILENAME))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.samples.is_empty() {
            return Err(PipelineError::Validation("No samples selected!".to_string()));
        }
        require(&self.out_dir, "Output directory")?;
        require_positive(self.plots, "Number of plots")?;
        Ok(())
    }

    /// Creates the output directory and writes the manifest into it.
    pub fn write_manifest(&self) -> Result<PathBuf, PipelineError> {
        let out_dir = require(&self.out_dir, "Output directory")?;
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(MANIFEST_FILENAME);
        let samples: Vec<&Sample> = self.samples.iter().collect();
        write_manifest(&path, &samples)?;
        debug!("Wrote {} samples to {}", samples.len(), path.display());
        Ok(path)
    }
}


/// Moves the samples named on the command line (or all of them) to the selected side.
pub fn select_from_args(set: &mut SelectionSet, names: &[String], all: bool) -> Result<(), PipelineError> {
    if all {
        set.select_all();
        return Ok(());
    }
    if let Some(unknown) = names.iter().find(|n| set.get(n).is_none()) {
        return Err(PipelineError::Validation(format!("Sample {} not found in input folder!", unknown)));
    }
    set.move_to_selected(names.iter().map(|n| n.as_str()))
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let args = &run_config.args;
    let input_dir = optional_path(&args.input_dir, &run_config.cwd)
        .ok_or_else(|| PipelineError::Validation("Input folder missing!".to_string()))?;

    let mode = if args.pair_by_name { PairingMode::ByName } else { PairingMode::Positional };
    let samples = SampleMatcher::with_mode(mode).discover(&input_dir)?;

    let mut set = SelectionSet::new(samples);
    select_from_args(&mut set, &args.samples, args.all_samples)?;
    info!("Selected {} of {} samples", set.selected().len(), set.len());

    let config = SelectionConfig::new(&set, optional_path(&args.out_dir, &run_config.cwd), Some(args.plots));
    config.validate()?;
    if !args.dry_run {
        config.write_manifest()?;
    }

    dispatch(&run_config, &StageConfig::Selection(config)).await?;
    Ok(())
}
