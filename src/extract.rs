use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;
use regex::Regex;
use serde::Serialize;

use crate::domain::Accession;
use crate::error::PipelineError;

const AF_TOKEN_PATTERN: &str = r"AF-([A-Z0-9]+)-";

/// Unique accessions pulled from Foldseek hits, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessionSet {
    pub total_hits: usize,
    pub accessions: Vec<Accession>,
}

impl AccessionSet {
    pub fn unique_count(&self) -> usize {
        self.accessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessions.is_empty()
    }
}

pub fn extract_accessions(path: &Utf8Path) -> Result<AccessionSet, PipelineError> {
    if !path.as_std_path().exists() {
        return Err(PipelineError::MissingInput(path.to_owned()));
    }
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| PipelineError::Filesystem(format!("read {path}: {err}")))?;
    extract_from_str(&content)
}

pub fn extract_from_str(content: &str) -> Result<AccessionSet, PipelineError> {
    let re_af = Regex::new(AF_TOKEN_PATTERN)
        .map_err(|err| PipelineError::InvalidPattern(err.to_string()))?;

    let mut total_hits = 0usize;
    let mut unique = BTreeSet::new();
    for line in content.lines() {
        let mut fields = line.trim().split('\t');
        let Some(target) = fields.nth(1) else {
            continue;
        };
        let Some(captures) = re_af.captures(target) else {
            continue;
        };
        // The capture group only admits [A-Z0-9]+, which is exactly what Accession accepts.
        if let Ok(accession) = captures[1].parse::<Accession>() {
            total_hits += 1;
            unique.insert(accession);
        }
    }

    Ok(AccessionSet {
        total_hits,
        accessions: unique.into_iter().collect(),
    })
}

/// Reads the single accession left behind by the sequence download step.
pub fn read_seed_accession(path: &Utf8Path) -> Result<Accession, PipelineError> {
    if !path.as_std_path().exists() {
        return Err(PipelineError::MissingInput(path.to_owned()));
    }
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| PipelineError::Filesystem(format!("read {path}: {err}")))?;
    content.parse()
}
