use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("required input file not found: {0}")]
    #[diagnostic(help("run the previous pipeline step first"))]
    MissingInput(Utf8PathBuf),

    #[error("invalid UniProt accession: {0:?}")]
    InvalidAccession(String),

    #[error("config file not found: {0}")]
    #[diagnostic(help("run `actseek-pipeline seed` first or pass --config"))]
    ConfigMissing(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("config field `{0}` is missing or empty")]
    ConfigFieldMissing(&'static str),

    #[error("config field `{key}` must be {expected}, found {found}")]
    ConfigFieldType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to encode JSON config: {0}")]
    ConfigEncode(String),

    #[error("AlphaFold request failed: {0}")]
    AlphaFoldHttp(String),

    #[error("AlphaFold returned status {status}: {message}")]
    AlphaFoldStatus { status: u16, message: String },

    #[error("failed to launch {program}: {message}")]
    CommandLaunch { program: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid accession pattern: {0}")]
    InvalidPattern(String),
}

impl PipelineError {
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::AlphaFoldHttp(_) | PipelineError::AlphaFoldStatus { .. }
        )
    }
}
