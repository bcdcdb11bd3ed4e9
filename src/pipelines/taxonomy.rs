use std::path::PathBuf;
use std::sync::Arc;
use log::info;

use crate::config::defs::{Database, PipelineError, RunConfig};
use crate::pipelines::{dispatch, optional_path, require, StageConfig};
use crate::utils::capability::CapabilityFlag;
use crate::utils::registry::{PipelineVersion, VersionRegistry};

/// Taxonomic assignment against a reference database (`qsub_taxonomy_DADA2.sh`).
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyConfig {
    /// Chimera-free sequence table (RData) from denoising.
    pub input: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    database: Option<Database>,
    available: Vec<Database>,
    pub save_phyloseq: bool,
    pub create_biom: bool,
    pub create_tree: bool,
}

impl TaxonomyConfig {
    /// Offers the databases installed for `version`, preselecting the first.
    ///
    /// # Arguments
    ///
    /// * `registry` - Loaded installations.
    /// * `version` - Installation the stage will run against.
    ///
    /// # Returns
    /// `PipelineError::NoDatabasesInstalled` when none of the databases is present.
    pub fn open(registry: &VersionRegistry, version: &PipelineVersion) -> Result<Self, PipelineError> {
        let available: Vec<Database> = Database::ALL
            .iter()
            .copied()
            .filter(|db| registry.capability_of(version, CapabilityFlag::Database(*db)))
            .collect();
        if available.is_empty() {
            return Err(PipelineError::NoDatabasesInstalled(version.label()));
        }

        Ok(TaxonomyConfig {
            input: None,
            out_dir: None,
            database: available.first().copied(),
            available,
            save_phyloseq: true,
            create_biom: false,
            create_tree: false,
        })
    }

    pub fn database(&self) -> Option<Database> {
        self.database
    }

    pub fn available(&self) -> &[Database] {
        &self.available
    }

    pub fn set_database(&mut self, database: Database) -> Result<(), PipelineError> {
        if !self.available.contains(&database) {
            return Err(PipelineError::Validation(format!(
                "{} database is not installed for this DADA2 version",
                database.display_name()
            )));
        }
        self.database = Some(database);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        require(&self.input, "Input RData file")?;
        require(&self.out_dir, "Output directory")?;
        let database = require(&self.database, "Reference database")?;
        if !self.available.contains(database) {
            return Err(PipelineError::Validation(format!("{} database not installed", database.display_name())));
        }
        Ok(())
    }

    pub fn from_args(run_config: &RunConfig) -> Result<Self, PipelineError> {
        let args = &run_config.args;
        let mut config = TaxonomyConfig::open(&run_config.registry, &run_config.version)?;
        config.input = optional_path(&args.input, &run_config.cwd);
        config.out_dir = optional_path(&args.out_dir, &run_config.cwd);
        config.save_phyloseq = !args.no_phyloseq;
        config.create_biom = args.biom;
        config.create_tree = args.tree;
        if let Some(code) = &args.database {
            let database = Database::from_code(code)
                .ok_or_else(|| PipelineError::InvalidConfig(format!("Unknown database '{}'", code)))?;
            config.set_database(database)?;
        }
        Ok(config)
    }
}


pub async fn run(run_config: Arc<RunConfig>) -> Result<(), PipelineError> {
    let config = TaxonomyConfig::from_args(&run_config)?;
    let names: Vec<&str> = config.available().iter().map(|db| db.display_name()).collect();
    info!("Installed databases: {}", names.join(", "));
    dispatch(&run_config, &StageConfig::Taxonomy(config)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::{self, Write};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn install(root: &Path, db: &str, files: &[&str]) -> io::Result<()> {
        let dir = root.join("taxonomy").join(db);
        fs::create_dir_all(&dir)?;
        for file in files {
            File::create(dir.join(file))?;
        }
        Ok(())
    }

    fn registry(root: &Path) -> io::Result<(TempDir, VersionRegistry)> {
        let dir = tempdir()?;
        let path = dir.path().join("versions.txt");
        let mut file = File::create(&path)?;
        write!(file, "version\tpath\tstatus\n1.10.0\t{}\tstable\n", root.display())?;
        file.flush()?;
        let registry = VersionRegistry::load(&path).map_err(|e| io::Error::other(e.to_string()))?;
        Ok((dir, registry))
    }

    #[test]
    fn test_no_databases_installed() -> io::Result<()> {
        let root = tempdir()?;
        let (_dir, registry) = registry(root.path())?;
        let version = registry.latest_stable().unwrap();
        assert!(matches!(
            TaxonomyConfig::open(&registry, version),
            Err(PipelineError::NoDatabasesInstalled(_))
        ));
        Ok(())
    }

    #[test]
    fn test_only_installed_databases_offered() -> io::Result<()> {
        let root = tempdir()?;
        install(root.path(), "rdp", &["rdp_train_set_16.fa.gz", "rdp_species_assignment_16.fa.gz"])?;
        install(root.path(), "unite", &["sh_general_release_dynamic.fasta"])?;
        // Missing species file.
        install(root.path(), "silva", &["silva_nr_v132_train_set.fa.gz"])?;
        let (_dir, registry) = registry(root.path())?;
        let version = registry.latest_stable().unwrap();

        let mut config = TaxonomyConfig::open(&registry, version).unwrap();
        assert_eq!(config.available(), [Database::Rdp, Database::Unite]);
        assert_eq!(config.database(), Some(Database::Rdp));
        assert!(config.save_phyloseq);

        assert!(matches!(config.set_database(Database::Silva), Err(PipelineError::Validation(_))));
        config.set_database(Database::Unite).unwrap();
        assert_eq!(config.database(), Some(Database::Unite));

        assert!(config.validate().is_err());
        config.input = Some(PathBuf::from("/data/seqtab_nochim.RData"));
        config.out_dir = Some(PathBuf::from("/data/taxonomy"));
        assert!(config.validate().is_ok());
        Ok(())
    }
}
