use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::Accession;
use crate::error::PipelineError;
use crate::extract::AccessionSet;
use crate::fs_util;

pub const ALPHAFOLD_FILES_URL: &str = "https://alphafold.ebi.ac.uk/files";

pub trait AlphaFoldClient {
    /// Fetches `file_name` from the model store and returns the whole body.
    fn download(&self, file_name: &str) -> Result<Vec<u8>, PipelineError>;
}

#[derive(Clone)]
pub struct AlphaFoldHttpClient {
    client: Client,
    base_url: String,
}

impl AlphaFoldHttpClient {
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_base_url(ALPHAFOLD_FILES_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, PipelineError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("actseek-pipeline/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PipelineError::AlphaFoldHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| PipelineError::AlphaFoldHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, file_name)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, PipelineError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("AlphaFold request failed")
            .to_string();
        Err(PipelineError::AlphaFoldStatus { status, message })
    }
}

impl AlphaFoldClient for AlphaFoldHttpClient {
    fn download(&self, file_name: &str) -> Result<Vec<u8>, PipelineError> {
        let url = self.file_url(file_name);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| PipelineError::AlphaFoldHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .bytes()
            .map_err(|err| PipelineError::AlphaFoldHttp(err.to_string()))?;
        Ok(body.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Cached,
    Downloaded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureItem {
    pub accession: Accession,
    pub status: FetchStatus,
    pub path: Utf8PathBuf,
    pub error: Option<String>,
}

/// Outcome of preparing every candidate: the manifest is the successful subset.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedStructures {
    pub items: Vec<StructureItem>,
}

impl PreparedStructures {
    pub fn ready(&self) -> Vec<Accession> {
        self.items
            .iter()
            .filter(|item| item.status != FetchStatus::Failed)
            .map(|item| item.accession.clone())
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == FetchStatus::Failed)
            .count()
    }
}

pub struct StructureFetcher<C: AlphaFoldClient> {
    client: C,
}

impl<C: AlphaFoldClient> StructureFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn ensure(
        &self,
        accession: &Accession,
        structures_dir: &Utf8Path,
    ) -> Result<(Utf8PathBuf, FetchStatus), PipelineError> {
        let path = accession.structure_path(structures_dir);
        let status = self.ensure_path(&path)?;
        Ok((path, status))
    }

    /// Ensures an explicit path exists, fetching the model named like its
    /// file name when it does not. An existing file is never touched.
    pub fn ensure_path(&self, path: &Utf8Path) -> Result<FetchStatus, PipelineError> {
        if path.as_std_path().exists() {
            debug!(path = %path, "structure already present");
            return Ok(FetchStatus::Cached);
        }
        let file_name = path.file_name().ok_or_else(|| {
            PipelineError::Filesystem(format!("structure path has no file name: {path}"))
        })?;
        info!(file = file_name, "downloading AlphaFold model");
        let body = self.client.download(file_name)?;
        fs_util::write_atomic(path, &body)?;
        info!(path = %path, bytes = body.len(), "saved AlphaFold model");
        Ok(FetchStatus::Downloaded)
    }

    /// Fetches every candidate in order. Download failures are recorded and
    /// skipped; filesystem errors still abort.
    pub fn prepare_all(
        &self,
        accessions: &AccessionSet,
        structures_dir: &Utf8Path,
    ) -> Result<PreparedStructures, PipelineError> {
        fs_util::ensure_dir(structures_dir)?;
        let mut items = Vec::with_capacity(accessions.unique_count());
        for accession in &accessions.accessions {
            let path = accession.structure_path(structures_dir);
            match self.ensure_path(&path) {
                Ok(status) => items.push(StructureItem {
                    accession: accession.clone(),
                    status,
                    path,
                    error: None,
                }),
                Err(err) if err.is_fetch_failure() => {
                    warn!(accession = %accession, error = %err, "download failed, skipping");
                    items.push(StructureItem {
                        accession: accession.clone(),
                        status: FetchStatus::Failed,
                        path,
                        error: Some(err.to_string()),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(PreparedStructures { items })
    }
}
