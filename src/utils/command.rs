/// Functions and structs for turning stage options into script invocations

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use log::debug;
use tokio::process::Command;

use crate::config::defs::PipelineError;
use crate::pipelines::StageConfig;
use crate::utils::registry::PipelineVersion;

/// Flag carrying the installation path; always the last argument.
pub const INSTALL_PATH_FLAG: &str = "-V";

/// One external invocation: executable, script and ordered flag/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub executable: String,
    pub script_arg: String,
    pub args: Vec<(String, Option<String>)>,
}

impl CommandSpec {
    /// Script followed by the flattened flags, as passed to the executable.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.args.len() * 2);
        argv.push(self.script_arg.clone());
        for (flag, value) in &self.args {
            argv.push(flag.clone());
            if let Some(value) = value {
                argv.push(value.clone());
            }
        }
        argv
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|(f, _)| f == flag)
    }

    /// Value following `flag`, `None` when absent or valueless.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(f, _)| f == flag)
            .and_then(|(_, v)| v.as_deref())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.executable, self.argv().join(" "))
    }
}


fn flag(name: &str, value: impl ToString) -> (String, Option<String>) {
    (name.to_string(), Some(value.to_string()))
}

fn switch(name: &str) -> (String, Option<String>) {
    (name.to_string(), None)
}

fn path_value(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
}


mod selection {
    use super::{flag, path_value};
    use crate::pipelines::SelectionConfig;

    pub fn arg_generator(config: &SelectionConfig) -> Vec<(String, Option<String>)> {
        let mut args_vec = Vec::new();
        args_vec.push(flag("-i", path_value(&config.manifest_path())));
        args_vec.push(flag("-o", path_value(&config.out_dir)));
        args_vec.push(flag("-p", config.plots.unwrap_or_default()));
        args_vec
    }
}

mod filtering {
    use super::{flag, path_value, switch};
    use crate::pipelines::FilteringConfig;

    pub fn arg_generator(config: &FilteringConfig) -> Vec<(String, Option<String>)> {
        let paired = config.is_paired();
        let mut args_vec = Vec::new();
        args_vec.push(flag("-f", path_value(&config.forward)));
        if paired {
            args_vec.push(flag("-r", path_value(&config.reverse)));
        }
        args_vec.push(flag("--truncLfwd", config.trunc_left_fwd));
        if paired {
            args_vec.push(flag("--truncLrev", config.trunc_left_rev));
        }
        args_vec.push(flag("-x", config.trunc_len_fwd.unwrap_or_default()));
        if paired {
            args_vec.push(flag("-y", config.trunc_len_rev.unwrap_or_default()));
        }
        args_vec.push(flag("-o", path_value(&config.out_dir)));
        args_vec.push(flag("-q", config.min_quality.unwrap_or_default()));

        if let Some(max_ee) = config.max_ee {
            args_vec.push(flag("-e", max_ee));
        }
        if let Some(min_len) = config.min_len_fwd {
            args_vec.push(flag("--minLenF", min_len));
        }
        if paired {
            if let Some(min_len) = config.min_len_rev {
                args_vec.push(flag("--minLenR", min_len));
            }
        }
        if let Some(max_len) = config.max_len_fwd {
            args_vec.push(flag("--maxLenF", max_len));
        }
        if paired {
            if let Some(max_len) = config.max_len_rev {
                args_vec.push(flag("--maxLenR", max_len));
            }
        }
        // The script compresses, reports and dereplicates by default; these switch it off.
        if !config.compress {
            args_vec.push(switch("-c"));
        }
        if !config.verbose {
            args_vec.push(switch("-v"));
        }
        if !config.dereplicate {
            args_vec.push(switch("-d"));
        }
        args_vec
    }
}

mod denoising {
    use super::{flag, path_value, switch};
    use crate::config::defs::DEFAULT_POOLING;
    use crate::pipelines::DenoisingConfig;

    pub fn arg_generator(config: &DenoisingConfig) -> Vec<(String, Option<String>)> {
        let mut args_vec = Vec::new();
        args_vec.push(flag("-f", path_value(&config.filtered_dir)));
        args_vec.push(flag("-o", path_value(&config.out_dir)));
        args_vec.push(flag("-p", config.plots.unwrap_or_default()));
        if config.pooling() != DEFAULT_POOLING {
            args_vec.push(flag("-r", config.pooling()));
        }
        if config.override_seqtab {
            args_vec.push(switch("-s"));
        }
        if config.override_chimera {
            args_vec.push(switch("-c"));
        }
        if config.concatenate {
            args_vec.push(switch("--concat"));
        }
        args_vec
    }
}

mod taxonomy {
    use super::{flag, path_value, switch};
    use crate::pipelines::TaxonomyConfig;

    pub fn arg_generator(config: &TaxonomyConfig) -> Vec<(String, Option<String>)> {
        let mut args_vec = Vec::new();
        args_vec.push(flag("-i", path_value(&config.input)));
        args_vec.push(flag("-o", path_value(&config.out_dir)));
        args_vec.push(flag("-d", config.database().map(|db| db.code()).unwrap_or_default()));
        if config.create_biom {
            args_vec.push(switch("-b"));
        }
        if config.create_tree {
            args_vec.push(switch("-t"));
        }
        if !config.save_phyloseq {
            args_vec.push(switch("--noPS"));
        }
        args_vec
    }
}

mod phylotree {
    use super::{flag, path_value};
    use crate::pipelines::PhyloTreeConfig;

    pub fn arg_generator(config: &PhyloTreeConfig) -> Vec<(String, Option<String>)> {
        vec![
            flag("-i", path_value(&config.input)),
            flag("-o", path_value(&config.out_dir)),
        ]
    }
}

mod tracker {
    use super::{flag, path_value};
    use crate::pipelines::TrackerConfig;

    pub fn arg_generator(config: &TrackerConfig) -> Vec<(String, Option<String>)> {
        vec![
            flag("-f", path_value(&config.filtering)),
            flag("-d", path_value(&config.dada)),
            flag("-m", path_value(&config.merged)),
            flag("-s", path_value(&config.seqtab_raw)),
            flag("-c", path_value(&config.seqtab_clean)),
            flag("-o", path_value(&config.out_dir)),
        ]
    }
}


/// Builds the command for a validated stage configuration.
///
/// # Arguments
///
/// * `config` - Stage options.
/// * `version` - Installation the script runs against.
/// * `script_dir` - Directory holding the stage scripts.
///
/// # Returns
/// The command, or the validation error of `config`. Identical inputs give identical commands.
pub fn build(config: &StageConfig, version: &PipelineVersion, script_dir: &Path) -> Result<CommandSpec, PipelineError> {
    config.validate()?;

    let stage = config.stage();
    let (executable, script) = stage.script();
    let mut args = match config {
        StageConfig::Selection(c) => selection::arg_generator(c),
        StageConfig::Filtering(c) => filtering::arg_generator(c),
        StageConfig::Denoising(c) => denoising::arg_generator(c),
        StageConfig::Taxonomy(c) => taxonomy::arg_generator(c),
        StageConfig::PhyloTree(c) => phylotree::arg_generator(c),
        StageConfig::Tracker(c) => tracker::arg_generator(c),
    };
    if stage.version_bound() {
        args.push(flag(INSTALL_PATH_FLAG, version.install_path.display()));
    }

    Ok(CommandSpec {
        executable: executable.to_string(),
        script_arg: script_dir.join(script).display().to_string(),
        args,
    })
}


/// Runs `spec` to completion with inherited output.
pub async fn run_command(spec: &CommandSpec) -> Result<(), PipelineError> {
    debug!("Spawning {}", spec);
    let status = Command::new(&spec.executable)
        .args(spec.argv())
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| PipelineError::ToolExecution {
            tool: spec.executable.clone(),
            error: format!("Failed to spawn: {}", e),
        })?;

    if !status.success() {
        return Err(PipelineError::ToolExecution {
            tool: spec.executable.clone(),
            error: format!("exited with {}", status),
        });
    }
    Ok(())
}
