use std::fs;

use camino::Utf8Path;

use crate::domain::Accession;
use crate::error::PipelineError;
use crate::fs_util;

/// Protein list handed to ActSeek via `-s`: one accession per line.
pub fn write_manifest(path: &Utf8Path, accessions: &[Accession]) -> Result<(), PipelineError> {
    let mut content = String::new();
    for accession in accessions {
        content.push_str(accession.as_str());
        content.push('\n');
    }
    fs_util::write_atomic(path, content.as_bytes())
}
