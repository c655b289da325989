use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use actseek_pipeline::alphafold::AlphaFoldHttpClient;
use actseek_pipeline::app::{App, PipelinePaths, SeedPaths};
use actseek_pipeline::command::DEFAULT_ACTSEEK_PROGRAM;
use actseek_pipeline::error::PipelineError;
use actseek_pipeline::output::{HumanOutput, JsonOutput, OutputMode};
use actseek_pipeline::runner::SystemCommandRunner;

#[derive(Parser)]
#[command(name = "actseek-pipeline")]
#[command(about = "Prepare AlphaFold models from Foldseek hits and run ActSeek in batch mode")]
#[command(version, author)]
struct Cli {
    /// Print the stage report as JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch candidate structures and run ActSeek against the configured seed")]
    Run(RunArgs),
    #[command(about = "Point config.json at the structure of the recorded seed accession")]
    Seed(SeedArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Foldseek hits table
    #[arg(long)]
    hits: Option<Utf8PathBuf>,

    /// Directory holding AlphaFold models
    #[arg(long)]
    structures_dir: Option<Utf8PathBuf>,

    /// Protein list passed to ActSeek
    #[arg(long)]
    manifest: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Where ActSeek output is written
    #[arg(long)]
    results: Option<Utf8PathBuf>,

    #[arg(long, default_value = DEFAULT_ACTSEEK_PROGRAM)]
    actseek_bin: String,
}

impl RunArgs {
    fn paths(&self) -> PipelinePaths {
        let defaults = PipelinePaths::default();
        PipelinePaths {
            hits: self.hits.clone().unwrap_or(defaults.hits),
            structures_dir: self.structures_dir.clone().unwrap_or(defaults.structures_dir),
            manifest: self.manifest.clone().unwrap_or(defaults.manifest),
            config: self.config.clone().unwrap_or(defaults.config),
            result_log: self.results.clone().unwrap_or(defaults.result_log),
        }
    }
}

#[derive(Args)]
struct SeedArgs {
    /// File holding the seed accession
    #[arg(long)]
    seed_accession: Option<Utf8PathBuf>,

    #[arg(long)]
    structures_dir: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<Utf8PathBuf>,
}

impl SeedArgs {
    fn paths(&self) -> SeedPaths {
        let defaults = SeedPaths::default();
        SeedPaths {
            seed_accession: self.seed_accession.clone().unwrap_or(defaults.seed_accession),
            structures_dir: self.structures_dir.clone().unwrap_or(defaults.structures_dir),
            config: self.config.clone().unwrap_or(defaults.config),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<PipelineError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PipelineError) -> u8 {
    match error {
        PipelineError::MissingInput(_)
        | PipelineError::InvalidAccession(_)
        | PipelineError::ConfigMissing(_)
        | PipelineError::ConfigRead(_)
        | PipelineError::ConfigParse(_)
        | PipelineError::ConfigFieldMissing(_)
        | PipelineError::ConfigFieldType { .. } => 2,
        PipelineError::AlphaFoldHttp(_)
        | PipelineError::AlphaFoldStatus { .. }
        | PipelineError::CommandLaunch { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::Run(args) => run_batch(args, output_mode),
        Commands::Seed(args) => run_seed(args, output_mode),
    }
}

fn run_batch(args: RunArgs, output_mode: OutputMode) -> miette::Result<()> {
    let paths = args.paths();
    let alphafold = AlphaFoldHttpClient::new()?;
    let app = App::new(alphafold, SystemCommandRunner).with_program(args.actseek_bin);
    let report = app.run_batch(&paths)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_batch(&report).into_diagnostic(),
        OutputMode::Human => HumanOutput::print_batch(&report).into_diagnostic(),
    }
}

fn run_seed(args: SeedArgs, output_mode: OutputMode) -> miette::Result<()> {
    let paths = args.paths();
    let alphafold = AlphaFoldHttpClient::new()?;
    let app = App::new(alphafold, SystemCommandRunner);
    let report = app.select_seed(&paths)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_seed(&report).into_diagnostic(),
        OutputMode::Human => HumanOutput::print_seed(&report).into_diagnostic(),
    }
}
