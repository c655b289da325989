use std::io::{self, Write};

use serde::Serialize;

use crate::alphafold::FetchStatus;
use crate::app::{BatchReport, SeedReport};
use crate::runner::RunOutcome;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_batch(report: &BatchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_seed(report: &SeedReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_batch(report: &BatchReport) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "Foldseek uncharacterized hits: {}", report.total_hits)?;
        writeln!(out, "Unique UniProt accessions: {}", report.unique_accessions)?;
        for item in &report.structures {
            let label = match item.status {
                FetchStatus::Cached => "cached",
                FetchStatus::Downloaded => "downloaded",
                FetchStatus::Failed => "failed",
            };
            match &item.error {
                Some(error) => writeln!(out, "  {label:<10} {} ({error})", item.accession)?,
                None => writeln!(out, "  {label:<10} {}", item.accession)?,
            }
        }
        writeln!(
            out,
            "Protein list: {} ({} accessions)",
            report.manifest_path,
            report.manifest.len()
        )?;
        writeln!(out, "Seed structure: {}", report.seed_path)?;
        match &report.outcome {
            RunOutcome::Succeeded => {
                writeln!(out, "ActSeek run complete. Results written to {}", report.result_log)?
            }
            RunOutcome::Failed { code } => {
                let code = code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                writeln!(
                    out,
                    "ActSeek batch mode failed with return code {code}. See {}",
                    report.result_log
                )?
            }
        }
        Ok(())
    }

    pub fn print_seed(report: &SeedReport) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "Seed accession: {}", report.accession)?;
        writeln!(out, "Seed structure: {}", report.seed_path)?;
        writeln!(out, "active_site: {}", report.active_site)?;
        writeln!(out, "Updated {}", report.config_path)?;
        Ok(())
    }
}
