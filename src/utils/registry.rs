// src/utils/registry.rs: known DADA2 installations and their capabilities

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, info, warn};
use serde::Deserialize;
use tokio::process::Command;

use crate::config::defs::{PipelineError, DADA2_PACKAGE, RSCRIPT_TAG, VERSIONS_HEADER};
use crate::utils::capability::{evaluate, CapabilityFlag, DataProbe, FsDataProbe};
use crate::utils::streams::{read_child_output_to_vec, ChildStream};
use crate::utils::version::SemVer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionStatus {
    Stable,
    Experimental,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Stable => "stable",
            VersionStatus::Experimental => "experimental",
        }
    }
}

impl std::str::FromStr for VersionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(VersionStatus::Stable),
            "experimental" => Ok(VersionStatus::Experimental),
            other => Err(format!("unknown status '{}', expected stable or experimental", other)),
        }
    }
}


/// One installed pipeline, fixed once the registry is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineVersion {
    pub id: SemVer,
    pub install_path: PathBuf,
    pub status: VersionStatus,
    pub capabilities: BTreeSet<CapabilityFlag>,
}

impl PipelineVersion {
    /// `"<version> (stable)"` or `"<version> (experimental)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.id, self.status.as_str())
    }

    pub fn has(&self, flag: CapabilityFlag) -> bool {
        self.capabilities.contains(&flag)
    }
}

impl fmt::Display for PipelineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}


#[derive(Debug, Deserialize)]
struct VersionRow {
    version: String,
    path: String,
    status: String,
}


/// What the version probe found when no versions file exists yet.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Found { version: SemVer, install_path: PathBuf },
    NotInstalled(String),
    RuntimeUnavailable(String),
}

/// Detects a single installed pipeline.
#[allow(async_fn_in_trait)]
pub trait VersionProbe {
    async fn probe(&self) -> ProbeOutcome;
}

/// Asks `Rscript` for the version and library location of the dada2 package.
#[derive(Debug, Clone, Copy, Default)]
pub struct RscriptProbe;

impl VersionProbe for RscriptProbe {
    async fn probe(&self) -> ProbeOutcome {
        let expr = format!(
            "cat(as.character(packageVersion('{pkg}')), dirname(find.package('{pkg}')), sep='\\t')",
            pkg = DADA2_PACKAGE
        );
        let mut child = match Command::new(RSCRIPT_TAG)
            .args(["-e", &expr])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return ProbeOutcome::RuntimeUnavailable(format!("Failed to spawn {}: {}. Is R installed?", RSCRIPT_TAG, e));
            }
        };

        let lines = match read_child_output_to_vec(&mut child, ChildStream::Stdout).await {
            Ok(lines) => lines,
            Err(e) => return ProbeOutcome::RuntimeUnavailable(e.to_string()),
        };
        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                return ProbeOutcome::NotInstalled(format!("{} exited with {} while loading {}", RSCRIPT_TAG, status, DADA2_PACKAGE));
            }
            Err(e) => return ProbeOutcome::RuntimeUnavailable(e.to_string()),
        }

        parse_probe_output(&lines)
    }
}

/// Parses the `<version>\t<library path>` line printed by the R probe.
fn parse_probe_output(lines: &[String]) -> ProbeOutcome {
    let first_line = match lines.first() {
        Some(line) => line,
        None => return ProbeOutcome::NotInstalled(format!("No output from {} probe", RSCRIPT_TAG)),
    };
    let mut fields = first_line.split('\t');
    let version = fields.next().map(str::parse::<SemVer>);
    let path = fields.next().filter(|p| !p.is_empty());
    match (version, path) {
        (Some(Ok(version)), Some(path)) => ProbeOutcome::Found { version, install_path: PathBuf::from(path) },
        _ => ProbeOutcome::NotInstalled(format!("Invalid probe output: {}", first_line)),
    }
}


/// The DADA2 installations known to this process, loaded once at startup.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: Vec<PipelineVersion>,
}

impl VersionRegistry {
    /// Loads a versions file, checking data directories on disk.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Self::load_with_probe(path, &FsDataProbe)
    }

    /// Loads a versions file (tab separated, header `version path status`).
    ///
    /// Any malformed or repeated row fails the whole load.
    pub fn load_with_probe(path: &Path, probe: &dyn DataProbe) -> Result<Self, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::Config(format!("{} does not exist", path.display())));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        if headers.iter().ne(VERSIONS_HEADER.iter().copied()) {
            return Err(PipelineError::Config(format!(
                "{}: expected header '{}', found '{}'",
                path.display(),
                VERSIONS_HEADER.join("\t"),
                headers.iter().collect::<Vec<_>>().join("\t")
            )));
        }

        let mut versions: Vec<PipelineVersion> = Vec::new();
        for (index, row) in reader.deserialize::<VersionRow>().enumerate() {
            let line = index + 2;
            let row = row.map_err(|e| PipelineError::Config(format!("{} line {}: {}", path.display(), line, e)))?;
            let id: SemVer = row
                .version
                .parse()
                .map_err(|e| PipelineError::Config(format!("{} line {}: {}", path.display(), line, e)))?;
            let status: VersionStatus = row
                .status
                .parse()
                .map_err(|e| PipelineError::Config(format!("{} line {}: {}", path.display(), line, e)))?;
            if versions.iter().any(|v| v.id == id && v.status == status) {
                return Err(PipelineError::Config(format!(
                    "{} line {}: {} ({}) is listed twice",
                    path.display(),
                    line,
                    id,
                    status.as_str()
                )));
            }
            let install_path = PathBuf::from(&row.path);

            let capabilities: BTreeSet<CapabilityFlag> = CapabilityFlag::all()
                .into_iter()
                .filter(|flag| evaluate(*flag, &id, &install_path, probe))
                .collect();
            debug!("Registered DADA2 {} ({}) at {} with {:?}", id, status.as_str(), install_path.display(), capabilities);

            versions.push(PipelineVersion { id, install_path, status, capabilities });
        }

        info!("Loaded {} DADA2 installation(s) from {}", versions.len(), path.display());
        Ok(VersionRegistry { versions })
    }

    /// Registry over already evaluated installations.
    pub fn from_versions(versions: Vec<PipelineVersion>) -> Self {
        VersionRegistry { versions }
    }

    /// Loads `path`, or detects an installation with `probe` and records it
    /// as the single stable entry of a new versions file when none exists.
    pub async fn open<P: VersionProbe>(path: &Path, probe: &P) -> Result<Self, PipelineError> {
        if path.exists() {
            return Self::load(path);
        }

        warn!("No versions file at {}; probing for an installed {} package", path.display(), DADA2_PACKAGE);
        match probe.probe().await {
            ProbeOutcome::RuntimeUnavailable(msg) => Err(PipelineError::RuntimeUnavailable(msg)),
            ProbeOutcome::NotInstalled(msg) => Err(PipelineError::NoInstallation(msg)),
            ProbeOutcome::Found { version, install_path } => {
                info!("Found {} {} at {}", DADA2_PACKAGE, version, install_path.display());
                write_versions_file(path, &version, &install_path)?;
                Self::load(path)
            }
        }
    }

    /// All installations with their labels, stable before experimental,
    /// each group in file order.
    pub fn installations(&self) -> Vec<(String, &PipelineVersion)> {
        self.group(VersionStatus::Stable)
            .chain(self.group(VersionStatus::Experimental))
            .map(|v| (v.label(), v))
            .collect()
    }

    pub fn stable(&self) -> impl Iterator<Item = &PipelineVersion> {
        self.group(VersionStatus::Stable)
    }

    pub fn experimental(&self) -> impl Iterator<Item = &PipelineVersion> {
        self.group(VersionStatus::Experimental)
    }

    fn group(&self, status: VersionStatus) -> impl Iterator<Item = &PipelineVersion> {
        self.versions.iter().filter(move |v| v.status == status)
    }

    /// Highest stable version by numeric comparison.
    pub fn latest_stable(&self) -> Result<&PipelineVersion, PipelineError> {
        self.stable()
            .max_by_key(|v| v.id)
            .ok_or_else(|| PipelineError::NoInstallation("no stable DADA2 version registered".to_string()))
    }

    pub fn capability_of(&self, version: &PipelineVersion, flag: CapabilityFlag) -> bool {
        version.has(flag)
    }

    /// Finds a version by label (`"1.10.0 (stable)"`) or bare id (`"1.10.0"`).
    /// Without a selector the latest stable version is returned.
    pub fn resolve(&self, selector: Option<&str>) -> Result<&PipelineVersion, PipelineError> {
        let selector = match selector {
            Some(s) => s.trim(),
            None => return self.latest_stable(),
        };
        if let Some((_, version)) = self.installations().into_iter().find(|(label, _)| label == selector) {
            return Ok(version);
        }
        let id: SemVer = selector
            .parse()
            .map_err(|_| PipelineError::UnknownVersion(selector.to_string()))?;
        // Prefer the stable entry when an id is registered twice.
        self.stable()
            .chain(self.experimental())
            .find(|v| v.id == id)
            .ok_or_else(|| PipelineError::UnknownVersion(selector.to_string()))
    }
}


fn write_versions_file(path: &Path, version: &SemVer, install_path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    let version = version.to_string();
    let install_path = install_path.to_string_lossy();
    writer
        .write_record(VERSIONS_HEADER)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    writer
        .write_record([version.as_str(), &*install_path, VersionStatus::Stable.as_str()])
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};
    use crate::config::defs::Database;

    fn versions_file(body: &str) -> io::Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "{}", body)?;
        tmp.flush()?;
        Ok(tmp)
    }

    struct FixedProbe(ProbeOutcome);

    impl VersionProbe for FixedProbe {
        async fn probe(&self) -> ProbeOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn test_labels_and_latest_stable() -> io::Result<()> {
        let tmp = versions_file(
            "version\tpath\tstatus\n1.8.0\t/opt/a\tstable\n1.10.0\t/opt/b\tstable\n1.12.1\t/opt/c\texperimental\n",
        )?;
        let registry = VersionRegistry::load(tmp.path()).unwrap();

        let labels: Vec<String> = registry.installations().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["1.8.0 (stable)", "1.10.0 (stable)", "1.12.1 (experimental)"]);

        let latest = registry.latest_stable().unwrap();
        assert_eq!(latest.id, SemVer::new(1, 10, 0));
        assert!(registry.capability_of(latest, CapabilityFlag::PseudoPooling));
        Ok(())
    }

    #[test]
    fn test_no_stable_group() -> io::Result<()> {
        let tmp = versions_file("version\tpath\tstatus\n1.12.1\t/opt/c\texperimental\n")?;
        let registry = VersionRegistry::load(tmp.path()).unwrap();
        assert!(matches!(registry.latest_stable(), Err(PipelineError::NoInstallation(_))));
        Ok(())
    }

    #[test]
    fn test_malformed_files_are_config_errors() -> io::Result<()> {
        let bad_header = versions_file("ver\tpath\tstatus\n1.8.0\t/opt/a\tstable\n")?;
        assert!(matches!(VersionRegistry::load(bad_header.path()), Err(PipelineError::Config(_))));

        let bad_columns = versions_file("version\tpath\tstatus\n1.8.0\t/opt/a\n")?;
        assert!(matches!(VersionRegistry::load(bad_columns.path()), Err(PipelineError::Config(_))));

        let bad_status = versions_file("version\tpath\tstatus\n1.8.0\t/opt/a\tbeta\n")?;
        assert!(matches!(VersionRegistry::load(bad_status.path()), Err(PipelineError::Config(_))));

        let bad_version = versions_file("version\tpath\tstatus\nlatest\t/opt/a\tstable\n")?;
        assert!(matches!(VersionRegistry::load(bad_version.path()), Err(PipelineError::Config(_))));

        let two_fields = versions_file("version\tpath\tstatus\n1.8\t/opt/a\tstable\n")?;
        assert!(matches!(VersionRegistry::load(two_fields.path()), Err(PipelineError::Config(_))));

        let dir = tempdir()?;
        assert!(matches!(VersionRegistry::load(&dir.path().join("missing.txt")), Err(PipelineError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_repeated_row_is_rejected() -> io::Result<()> {
        let repeated = versions_file("version\tpath\tstatus\n1.8.0\t/opt/a\tstable\n1.8.0\t/opt/b\tstable\n")?;
        assert!(matches!(VersionRegistry::load(repeated.path()), Err(PipelineError::Config(_))));

        let both_groups = versions_file("version\tpath\tstatus\n1.8.0\t/opt/a\tstable\n1.8.0\t/opt/b\texperimental\n")?;
        let registry = VersionRegistry::load(both_groups.path()).unwrap();
        let labels: Vec<String> = registry.installations().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["1.8.0 (stable)", "1.8.0 (experimental)"]);
        Ok(())
    }

    #[test]
    fn test_database_capability_from_install_dir() -> io::Result<()> {
        let install = tempdir()?;
        let rdp = install.path().join("taxonomy").join("rdp");
        fs::create_dir_all(&rdp)?;
        fs::File::create(rdp.join("rdp_train_set_16.fa.gz"))?;
        fs::File::create(rdp.join("rdp_species_assignment_16.fa.gz"))?;

        let tmp = versions_file(&format!("version\tpath\tstatus\n1.6.0\t{}\tstable\n", install.path().display()))?;
        let registry = VersionRegistry::load(tmp.path()).unwrap();
        let version = registry.latest_stable().unwrap();
        assert!(registry.capability_of(version, CapabilityFlag::Database(Database::Rdp)));
        assert!(!registry.capability_of(version, CapabilityFlag::Database(Database::Silva)));
        assert!(!registry.capability_of(version, CapabilityFlag::PseudoPooling));
        Ok(())
    }

    #[test]
    fn test_resolve_by_label_and_id() -> io::Result<()> {
        let tmp = versions_file("version\tpath\tstatus\n1.8.0\t/opt/a\tstable\n1.12.1\t/opt/c\texperimental\n")?;
        let registry = VersionRegistry::load(tmp.path()).unwrap();
        assert_eq!(registry.resolve(None).unwrap().id, SemVer::new(1, 8, 0));
        assert_eq!(registry.resolve(Some("1.12.1 (experimental)")).unwrap().id, SemVer::new(1, 12, 1));
        assert_eq!(registry.resolve(Some("1.12.1")).unwrap().status, VersionStatus::Experimental);
        assert!(matches!(registry.resolve(Some("2.0.0")), Err(PipelineError::UnknownVersion(_))));
        assert!(matches!(registry.resolve(Some("newest")), Err(PipelineError::UnknownVersion(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_bootstrap_writes_single_stable_row() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("package").join("versionsDADA2.txt");
        let probe = FixedProbe(ProbeOutcome::Found {
            version: SemVer::new(1, 14, 0),
            install_path: PathBuf::from("/usr/lib/R/site-library"),
        });

        let registry = VersionRegistry::open(&path, &probe).await.unwrap();
        assert_eq!(registry.installations().len(), 1);
        assert_eq!(registry.latest_stable().unwrap().label(), "1.14.0 (stable)");

        let written = fs::read_to_string(&path)?;
        assert_eq!(written, "version\tpath\tstatus\n1.14.0\t/usr/lib/R/site-library\tstable\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_bootstrap_failures() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("versionsDADA2.txt");

        let no_r = FixedProbe(ProbeOutcome::RuntimeUnavailable("Rscript missing".to_string()));
        assert!(matches!(VersionRegistry::open(&path, &no_r).await, Err(PipelineError::RuntimeUnavailable(_))));

        let no_pkg = FixedProbe(ProbeOutcome::NotInstalled("no dada2".to_string()));
        assert!(matches!(VersionRegistry::open(&path, &no_pkg).await, Err(PipelineError::NoInstallation(_))));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_parse_probe_output() {
        let found = parse_probe_output(&["1.26.0\t/usr/local/lib/R/site-library".to_string()]);
        assert_eq!(
            found,
            ProbeOutcome::Found {
                version: SemVer::new(1, 26, 0),
                install_path: PathBuf::from("/usr/local/lib/R/site-library"),
            }
        );
        assert!(matches!(parse_probe_output(&[]), ProbeOutcome::NotInstalled(_)));
        assert!(matches!(parse_probe_output(&["1.26.0".to_string()]), ProbeOutcome::NotInstalled(_)));
    }
}
