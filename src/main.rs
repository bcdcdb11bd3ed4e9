use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, debug, error, info};

use dada2_dispatch::cli::parse;
use dada2_dispatch::config::defs::{PipelineError, RunConfig};
use dada2_dispatch::pipelines::{denoising, filtering, phylotree, selection, taxonomy, tracker};
use dada2_dispatch::utils::file::absolute_from;
use dada2_dispatch::utils::registry::{RscriptProbe, VersionRegistry, VersionStatus};


#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let dir = env::current_dir()?;
    debug!("The current directory is {:?}", dir);

    let versions_file = absolute_from(&PathBuf::from(&args.versions_file), &dir);
    let registry = match VersionRegistry::open(&versions_file, &RscriptProbe).await {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let module = args.module.clone();
    if module == "versions" {
        list_versions(&registry);
        return Ok(());
    }

    let version = match registry.resolve(args.dada2_version.as_deref()) {
        Ok(version) => version.clone(),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Using DADA2 {} at {}", version.label(), version.install_path.display());

    let script_dir = absolute_from(&PathBuf::from(&args.script_dir), &dir);
    let run_config = Arc::new(RunConfig {
        cwd: dir,
        script_dir,
        registry,
        version,
        args,
    });

    if let Err(e) = match module.as_str() {
        "select" => selection::run(run_config).await,
        "filter" => filtering::run(run_config).await,
        "denoise" => denoising::run(run_config).await,
        "taxonomy" => taxonomy::run(run_config).await,
        "phylotree" => phylotree::run(run_config).await,
        "tracker" => tracker::run(run_config).await,
        _ => Err(PipelineError::InvalidConfig(format!("Invalid module: {}", module))),
    } {
        error!("Stage {} failed: {} after {} milliseconds.", module, e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    debug!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


/// Prints every registered installation, stable first, with its capabilities.
///
/// # Arguments
/// * `registry` - Loaded installations.
fn list_versions(registry: &VersionRegistry) {
    let latest = registry.latest_stable().ok().map(|v| v.id);
    for (label, version) in registry.installations() {
        let marker = if Some(version.id) == latest && version.status == VersionStatus::Stable { " *" } else { "" };
        let capabilities: Vec<String> = version.capabilities.iter().map(|c| c.to_string()).collect();
        println!(
            "{}{}\t{}\t{}",
            label,
            marker,
            version.install_path.display(),
            if capabilities.is_empty() { "-".to_string() } else { capabilities.join(", ") }
        );
    }
}
