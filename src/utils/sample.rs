// src/utils/sample.rs: pairing forward/reverse read files into samples

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};

use crate::config::defs::{PipelineError, FORWARD_MARKER, REVERSE_MARKER, SAMPLE_NAME_DELIMITER};
use crate::utils::file::list_dir_files;

/// A named pair of read files. Both files existed when the sample was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    name: String,
    forward_path: PathBuf,
    reverse_path: PathBuf,
}

impl Sample {
    /// Builds a sample from file names inside `dir`.
    ///
    /// # Arguments
    ///
    /// * `name` - Sample name, the unique key.
    /// * `forward` - Forward read file name.
    /// * `reverse` - Reverse read file name.
    /// * `dir` - Directory holding both files.
    ///
    /// # Returns
    /// The sample, or `PipelineError::Pairing` when either file is not a regular file.
    pub fn new(name: &str, forward: &str, reverse: &str, dir: &Path) -> Result<Self, PipelineError> {
        let forward_path = dir.join(forward);
        let reverse_path = dir.join(reverse);
        for path in [&forward_path, &reverse_path] {
            if !path.is_file() {
                return Err(PipelineError::Pairing(format!(
                    "sample {}: {} is not an existing file",
                    name,
                    path.display()
                )));
            }
        }
        Ok(Sample {
            name: name.to_string(),
            forward_path,
            reverse_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn forward_path(&self) -> &Path {
        &self.forward_path
    }

    pub fn reverse_path(&self) -> &Path {
        &self.reverse_path
    }
}


/// How forward and reverse files are matched up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// i-th sorted name with the i-th sorted forward and reverse files.
    #[default]
    Positional,
    /// Forward and reverse files whose derived sample names are equal.
    ByName,
}


#[derive(Debug, Clone)]
pub struct SampleMatcher {
    pub forward_marker: String,
    pub reverse_marker: String,
    pub delimiter: char,
    pub mode: PairingMode,
}

impl Default for SampleMatcher {
    fn default() -> Self {
        SampleMatcher {
            forward_marker: FORWARD_MARKER.to_string(),
            reverse_marker: REVERSE_MARKER.to_string(),
            delimiter: SAMPLE_NAME_DELIMITER,
            mode: PairingMode::Positional,
        }
    }
}

impl SampleMatcher {
    pub fn with_mode(mode: PairingMode) -> Self {
        SampleMatcher { mode, ..Default::default() }
    }

    /// Sample name of a read file: everything before the first delimiter.
    pub fn sample_name<'a>(&self, file_name: &'a str) -> &'a str {
        file_name.split(self.delimiter).next().unwrap_or(file_name)
    }

    /// Scans the immediate children of `dir` and pairs read files into samples,
    /// sorted by name. Any unbuildable sample aborts the whole scan.
    pub fn discover(&self, dir: &Path) -> Result<Vec<Sample>, PipelineError> {
        let files = list_dir_files(dir)
            .map_err(|e| PipelineError::Pairing(format!("cannot list {}: {}", dir.display(), e)))?;

        let mut forward: Vec<String> = files.iter().filter(|f| f.contains(&self.forward_marker)).cloned().collect();
        let mut reverse: Vec<String> = files.iter().filter(|f| f.contains(&self.reverse_marker)).cloned().collect();
        forward.sort();
        reverse.sort();
        debug!("{}: {} forward and {} reverse candidates", dir.display(), forward.len(), reverse.len());

        let samples = match self.mode {
            PairingMode::Positional => self.pair_positional(dir, &forward, &reverse)?,
            PairingMode::ByName => self.pair_by_name(dir, &forward, &reverse)?,
        };
        info!("Discovered {} samples in {}", samples.len(), dir.display());
        Ok(samples)
    }

    fn pair_positional(&self, dir: &Path, forward: &[String], reverse: &[String]) -> Result<Vec<Sample>, PipelineError> {
        let mut names: Vec<&str> = forward.iter().map(|f| self.sample_name(f)).collect();
        names.sort();
        names.dedup();

        if names.len() != forward.len() || forward.len() != reverse.len() {
            warn!(
                "{}: {} sample names, {} forward and {} reverse files; positional pairing may misalign",
                dir.display(),
                names.len(),
                forward.len(),
                reverse.len()
            );
        }

        names
            .iter()
            .zip(forward.iter())
            .zip(reverse.iter())
            .map(|((name, fw), rv)| Sample::new(name, fw, rv, dir))
            .collect()
    }

    fn pair_by_name(&self, dir: &Path, forward: &[String], reverse: &[String]) -> Result<Vec<Sample>, PipelineError> {
        let mut reverse_by_name: BTreeMap<&str, &str> = BTreeMap::new();
        for rv in reverse {
            if reverse_by_name.insert(self.sample_name(rv), rv).is_some() {
                return Err(PipelineError::Pairing(format!("several reverse files for sample {}", self.sample_name(rv))));
            }
        }

        let mut pairs: BTreeMap<&str, (&str, &str)> = BTreeMap::new();
        for fw in forward {
            let name = self.sample_name(fw);
            let rv = reverse_by_name
                .remove(name)
                .ok_or_else(|| PipelineError::Pairing(format!("no reverse file for {}", fw)))?;
            if pairs.insert(name, (fw.as_str(), rv)).is_some() {
                return Err(PipelineError::Pairing(format!("several forward files for sample {}", name)));
            }
        }
        if let Some((name, rv)) = reverse_by_name.into_iter().next() {
            return Err(PipelineError::Pairing(format!("no forward file for sample {} ({})", name, rv)));
        }

        pairs
            .into_iter()
            .map(|(name, (fw, rv))| Sample::new(name, fw, rv, dir))
            .collect()
    }
}
