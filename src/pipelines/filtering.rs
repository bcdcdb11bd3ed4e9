use std::path::PathBuf;
use std::sync::Arc;
use log::info;

use crate::config::defs::{PipelineError, RunConfig, DEFAULT_TRUNC_LEFT, DEFAULT_TRUNC_LEN, DEFAULT_MIN_QUALITY};
use crate::pipelines::{dispatch, optional_path, require, StageConfig};
use crate::utils::file::short_display;

/// Quality filtering and trimming (`filtering.R`).
///
/// Fields ending in `_rev` only apply when reverse reads are given.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteringConfig {
    pub forward: Option<PathBuf>,
    pub reverse: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// The user accepted running without reverse reads.
    pub single_end_confirmed: bool,
    /// Cut before.
    pub trunc_left_fwd: u32,
    pub trunc_left_rev: u32,
    /// Cut after.
    pub trunc_len_fwd: Option<u32>,
    pub trunc_len_rev: Option<u32>,
    pub min_len_fwd: Option<u32>,
    pub min_len_rev: Option<u32>,
    pub max_len_fwd: Option<u32>,
    pub max_len_rev: Option<u32>,
    pub max_ee: Option<u32>,
    pub min_quality: Option<u32>,
    pub compress: bool,
    pub verbose: bool,
    /// Dereplication is not offered by the filtering script yet; stays off.
    pub dereplicate: bool,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        FilteringConfig {
            forward: None,
            reverse: None,
            out_dir: None,
            single_end_confirmed: false,
            trunc_left_fwd: DEFAULT_TRUNC_LEFT,
            trunc_left_rev: DEFAULT_TRUNC_LEFT,
            trunc_len_fwd: Some(DEFAULT_TRUNC_LEN),
            trunc_len_rev: None,
            min_len_fwd: None,
            min_len_rev: None,
            max_len_fwd: None,
            max_len_rev: None,
            max_ee: None,
            min_quality: Some(DEFAULT_MIN_QUALITY),
            compress: true,
            verbose: true,
            dereplicate: false,
        }
    }
}

impl FilteringConfig {
    pub fn is_paired(&self) -> bool {
        self.reverse.is_some()
    }

    /// Sets or clears the reverse reads. Supplying them fills in the reverse
    /// truncation length the same way the forward one starts out.
    pub fn set_reverse(&mut self, reverse: Option<PathBuf>) {
        if reverse.is_some() && self.trunc_len_rev.is_none() {
            self.trunc_len_rev = Some(DEFAULT_TRUNC_LEN);
        }
        if reverse.is_none() {
            self.trunc_left_rev = DEFAULT_TRUNC_LEFT;
            self.trunc_len_rev = None;
            self.min_len_rev = None;
            self.max_len_rev = None;
        }
        self.reverse = reverse;
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        require(&self.forward, "Forward reads path")?;
        require(&self.out_dir, "Output directory")?;
        require(&self.trunc_len_fwd, "Forward truncation length (cut after)")?;
        require(&self.min_quality, "Setting for minimum read quality score")?;

        if self.is_paired() {
            require(&self.trunc_len_rev, "Reverse truncation length (cut after)")?;
        } else {
            let reverse_only = self.trunc_left_rev != DEFAULT_TRUNC_LEFT
                || self.trunc_len_rev.is_some()
                || self.min_len_rev.is_some()
                || self.max_len_rev.is_some();
            if reverse_only {
                return Err(PipelineError::Validation(
                    "Reverse read options need a reverse reads path!".to_string(),
                ));
            }
            if !self.single_end_confirmed {
                return Err(PipelineError::SingleEndUnconfirmed);
            }
        }
        Ok(())
    }

    pub fn from_args(run_config: &RunConfig) -> Self {
        let args = &run_config.args;
        let mut config = FilteringConfig {
            forward: optional_path(&args.forward, &run_config.cwd),
            out_dir: optional_path(&args.out_dir, &run_config.cwd),
            single_end_confirmed: args.single_end,
            trunc_left_fwd: args.trunc_left_fwd,
            trunc_left_rev: args.trunc_left_rev.unwrap_or(DEFAULT_TRUNC_LEFT),
            trunc_len_fwd: Some(args.trunc_len_fwd),
            trunc_len_rev: args.trunc_len_rev,
            min_len_fwd: args.min_len_fwd,
            min_len_rev: args.min_len_rev,
            max_len_fwd: args.max_len_fwd,
            max_len_rev: args.max_len_rev,
            max_ee: args.max_ee,
            min_quality: Some(args.min_quality),
            compress: !args.no_compress,
            verbose: !args.quiet_filter,
            ..Default::default()
        };
        let reverse = optional_path(&args.reverse, &run_config.cwd);
        if reverse.is_some() {
            config.set_reverse(reverse);
        }
        config
    }
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let config = FilteringConfig::from_args(&run_config);
    if let Some(forward) = &config.forward {
        info!("Forward reads in {}", short_display(forward));
    }
    match &config.reverse {
        Some(reverse) => info!("Reverse reads in {}", short_display(reverse)),
        None => info!("No reverse reads given; filtering single-end"),
    }
    dispatch(&run_config, &StageConfig::Filtering(config)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn single_end() -> FilteringConfig {
        FilteringConfig {
            forward: Some(PathBuf::from("/data/filter/fwdPaths.txt")),
            out_dir: Some(PathBuf::from("/data/filtered")),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_end_needs_confirmation() {
        let mut config = single_end();
        assert!(matches!(config.validate(), Err(PipelineError::SingleEndUnconfirmed)));
        config.single_end_confirmed = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut config = single_end();
        config.single_end_confirmed = true;

        let mut missing = config.clone();
        missing.forward = None;
        assert!(matches!(missing.validate(), Err(PipelineError::Validation(_))));

        let mut missing = config.clone();
        missing.out_dir = None;
        assert!(matches!(missing.validate(), Err(PipelineError::Validation(_))));

        let mut missing = config.clone();
        missing.trunc_len_fwd = None;
        assert!(matches!(missing.validate(), Err(PipelineError::Validation(_))));

        let mut missing = config;
        missing.min_quality = None;
        assert!(matches!(missing.validate(), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_reverse_only_fields_follow_reverse_path() {
        let mut config = single_end();
        config.single_end_confirmed = true;
        config.max_len_rev = Some(250);
        assert!(matches!(config.validate(), Err(PipelineError::Validation(_))));

        config.set_reverse(Some(PathBuf::from("/data/filter/revPaths.txt")));
        assert_eq!(config.trunc_len_rev, Some(DEFAULT_TRUNC_LEN));
        assert!(config.validate().is_ok());

        config.trunc_len_rev = None;
        assert!(matches!(config.validate(), Err(PipelineError::Validation(_))));

        config.set_reverse(None);
        assert_eq!(config.max_len_rev, None);
        assert!(config.validate().is_ok());
    }
}
