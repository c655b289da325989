use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// UniProt accession as it appears inside AlphaFold model names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// AlphaFold DB file name for the first fragment of the v4 model.
    pub fn structure_file_name(&self) -> String {
        structure_file_name(&self.0)
    }

    pub fn structure_path(&self, structures_dir: &Utf8Path) -> Utf8PathBuf {
        structures_dir.join(self.structure_file_name())
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit());
        if !is_valid {
            return Err(PipelineError::InvalidAccession(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

pub fn structure_file_name(accession: &str) -> String {
    format!("AF-{accession}-F1-model_v4.pdb")
}
