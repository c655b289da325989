use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::info;

use crate::alphafold::{AlphaFoldClient, FetchStatus, StructureFetcher, StructureItem};
use crate::command::{BatchCommandBuilder, DEFAULT_ACTSEEK_PROGRAM};
use crate::config::{ConfigScalar, ConfigStore};
use crate::domain::Accession;
use crate::error::PipelineError;
use crate::extract::{extract_accessions, read_seed_accession};
use crate::manifest::write_manifest;
use crate::runner::{BatchRunner, CommandRunner, RunOutcome};

/// File layout of the batch stage. Defaults match the directory layout the
/// Foldseek step leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub hits: Utf8PathBuf,
    pub structures_dir: Utf8PathBuf,
    pub manifest: Utf8PathBuf,
    pub config: Utf8PathBuf,
    pub result_log: Utf8PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            hits: Utf8PathBuf::from("uncharacterized_hits.txt"),
            structures_dir: Utf8PathBuf::from("../structures"),
            manifest: Utf8PathBuf::from("test.txt"),
            config: Utf8PathBuf::from("config.json"),
            result_log: Utf8PathBuf::from("../results/actseek_results.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPaths {
    pub seed_accession: Utf8PathBuf,
    pub structures_dir: Utf8PathBuf,
    pub config: Utf8PathBuf,
}

impl Default for SeedPaths {
    fn default() -> Self {
        Self {
            seed_accession: Utf8PathBuf::from("query_seed_accession.txt"),
            structures_dir: Utf8PathBuf::from("../structures"),
            config: Utf8PathBuf::from("config.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub total_hits: usize,
    pub unique_accessions: usize,
    pub structures: Vec<StructureItem>,
    pub manifest_path: Utf8PathBuf,
    pub manifest: Vec<Accession>,
    pub seed_path: Utf8PathBuf,
    pub seed_status: FetchStatus,
    pub command: Vec<String>,
    pub result_log: Utf8PathBuf,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub generated_at: String,
    pub accession: Accession,
    pub seed_path: Utf8PathBuf,
    pub seed_status: FetchStatus,
    pub active_site: String,
    pub config_path: Utf8PathBuf,
}

pub struct App<C: AlphaFoldClient, R: CommandRunner> {
    fetcher: StructureFetcher<C>,
    runner: BatchRunner<R>,
    program: String,
}

impl<C: AlphaFoldClient, R: CommandRunner> App<C, R> {
    pub fn new(alphafold: C, runner: R) -> Self {
        Self {
            fetcher: StructureFetcher::new(alphafold),
            runner: BatchRunner::new(runner),
            program: DEFAULT_ACTSEEK_PROGRAM.to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn alphafold(&self) -> &C {
        self.fetcher.client()
    }

    pub fn command_runner(&self) -> &R {
        self.runner.runner()
    }

    /// Extract → fetch candidates → write manifest → validate config →
    /// fetch seed → run ActSeek once.
    pub fn run_batch(&self, paths: &PipelinePaths) -> Result<BatchReport, PipelineError> {
        let accessions = extract_accessions(&paths.hits)?;
        info!(
            hits = accessions.total_hits,
            unique = accessions.unique_count(),
            "extracted uncharacterized accessions"
        );

        let prepared = self.fetcher.prepare_all(&accessions, &paths.structures_dir)?;
        let ready = prepared.ready();
        write_manifest(&paths.manifest, &ready)?;
        info!(
            manifest = %paths.manifest,
            ready = ready.len(),
            failed = prepared.failed_count(),
            "wrote protein list"
        );

        // Every required field is checked before the seed request goes out.
        let config = ConfigStore::load(&paths.config)?.into_settings();
        let seed_path = config.validate_seed()?;
        let command = BatchCommandBuilder::build(&self.program, &config)?;

        let seed_status = self.fetcher.ensure_path(&seed_path)?;
        info!(seed = %seed_path, status = ?seed_status, "seed structure ready");

        let outcome = self.runner.run(&command, &paths.result_log)?;

        Ok(BatchReport {
            generated_at: iso_timestamp(),
            total_hits: accessions.total_hits,
            unique_accessions: accessions.unique_count(),
            structures: prepared.items,
            manifest_path: paths.manifest.clone(),
            manifest: ready,
            seed_path,
            seed_status,
            command: command.tokens(),
            result_log: paths.result_log.clone(),
            outcome,
        })
    }

    /// Points `config.json` at the structure of the recorded seed accession,
    /// downloading it when missing. Always resets `active_site` to the
    /// placeholder.
    pub fn select_seed(&self, paths: &SeedPaths) -> Result<SeedReport, PipelineError> {
        let accession = read_seed_accession(&paths.seed_accession)?;
        info!(accession = %accession, "selected seed accession");

        let seed_path = accession.structure_path(&paths.structures_dir);
        let mut config = ConfigStore::load(&paths.config)?;

        let seed_status = self.fetcher.ensure_path(&seed_path)?;
        info!(seed = %seed_path, status = ?seed_status, "seed structure ready");

        config.apply_seed(&seed_path);
        ConfigStore::save(&config, &paths.config)?;
        let active_site = active_site_text(&config.settings().active_site);
        info!(config = %paths.config, active_site = %active_site, "updated config");

        Ok(SeedReport {
            generated_at: iso_timestamp(),
            accession,
            seed_path,
            seed_status,
            active_site,
            config_path: paths.config.clone(),
        })
    }
}

fn active_site_text(value: &Option<ConfigScalar>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
