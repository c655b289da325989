use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use actseek_pipeline::alphafold::{AlphaFoldClient, FetchStatus};
use actseek_pipeline::app::{App, PipelinePaths, SeedPaths};
use actseek_pipeline::command::BatchCommand;
use actseek_pipeline::config::ConfigStore;
use actseek_pipeline::error::PipelineError;
use actseek_pipeline::runner::{CommandOutput, CommandRunner, RunOutcome};

#[derive(Default)]
struct MockAlphaFold {
    calls: Mutex<Vec<String>>,
    unavailable: Vec<String>,
}

impl MockAlphaFold {
    fn without(file_name: &str) -> Self {
        Self {
            unavailable: vec![file_name.to_string()],
            ..Self::default()
        }
    }
}

impl AlphaFoldClient for MockAlphaFold {
    fn download(&self, file_name: &str) -> Result<Vec<u8>, PipelineError> {
        self.calls.lock().unwrap().push(file_name.to_string());
        if self.unavailable.iter().any(|name| name == file_name) {
            return Err(PipelineError::AlphaFoldStatus {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(b"ATOM\n".to_vec())
    }
}

struct MockRunner {
    output: CommandOutput,
    seen: Mutex<Vec<BatchCommand>>,
}

impl MockRunner {
    fn exiting(code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            output: CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &BatchCommand) -> Result<CommandOutput, PipelineError> {
        self.seen.lock().unwrap().push(command.clone());
        Ok(self.output.clone())
    }
}

struct Workspace {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        Self { _temp: temp, root }
    }

    fn batch_paths(&self) -> PipelinePaths {
        PipelinePaths {
            hits: self.root.join("uncharacterized_hits.txt"),
            structures_dir: self.root.join("structures"),
            manifest: self.root.join("test.txt"),
            config: self.root.join("config.json"),
            result_log: self.root.join("results").join("actseek_results.txt"),
        }
    }

    fn seed_paths(&self) -> SeedPaths {
        SeedPaths {
            seed_accession: self.root.join("query_seed_accession.txt"),
            structures_dir: self.root.join("structures"),
            config: self.root.join("config.json"),
        }
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.root.join(name).as_std_path(), content).unwrap();
    }

    fn read(&self, path: &Utf8PathBuf) -> String {
        fs::read_to_string(path.as_std_path()).unwrap()
    }

    fn write_config(&self, seed: Option<&str>) {
        let mut config = serde_json::json!({
            "active_site": "10,57,102",
            "selected_active": "10,57",
            "aa_grouping": {"polar": ["S", "T", "N", "Q"]},
            "random_seed": 69,
            "threshold": 2,
            "threshold_combinations": 3,
            "aa_surrounding": 3,
            "aa_surrounding_threshold": 0.3,
            "threshold_others": 1,
            "iterations": 500,
            "first_in_file": 0,
            "max_protein": 1000,
            "protein_file": "test.txt",
            "alphafold_proteins_path": "structures",
            "path_results": "results",
            "KVFinder": true
        });
        if let Some(seed) = seed {
            config["seed_protein_file"] = serde_json::Value::String(seed.to_string());
        }
        self.write("config.json", &config.to_string());
    }
}

const HITS: &str = "q\tAF-Q9XYZ1-F1-model_v4.pdb\t0.9\nq\tAF-P69905-F1-model_v4.pdb\t0.8\n";

#[test]
fn successful_run_logs_stdout_only() {
    let ws = Workspace::new();
    ws.write("uncharacterized_hits.txt", HITS);
    let seed = ws.root.join("seed.pdb");
    fs::write(seed.as_std_path(), b"seed").unwrap();
    ws.write_config(Some(seed.as_str()));

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "OK", ""));
    let paths = ws.batch_paths();
    let report = app.run_batch(&paths).unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(ws.read(&paths.result_log), "OK");
    assert_eq!(ws.read(&paths.manifest), "P69905\nQ9XYZ1\n");
    assert_eq!(report.seed_status, FetchStatus::Cached);
    assert_eq!(app.alphafold().calls.lock().unwrap().len(), 2);

    let seen = app.command_runner().seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].program, "actseek");
    assert!(seen[0].args.contains(&seed.to_string()));
    assert_eq!(seen[0].args.last().map(String::as_str), Some("-kv"));
}

#[test]
fn failed_run_is_recorded_not_raised() {
    let ws = Workspace::new();
    ws.write("uncharacterized_hits.txt", HITS);
    let seed = ws.root.join("seed.pdb");
    fs::write(seed.as_std_path(), b"seed").unwrap();
    ws.write_config(Some(seed.as_str()));

    let app = App::new(
        MockAlphaFold::default(),
        MockRunner::exiting(2, "", "bad input"),
    );
    let paths = ws.batch_paths();
    let report = app.run_batch(&paths).unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed { code: Some(2) });
    let log = ws.read(&paths.result_log);
    assert!(log.starts_with("ACTSEEK_BATCH_FAILED\n"));
    assert!(log.contains("STDERR:\nbad input"));
}

#[test]
fn missing_seed_field_stops_before_seed_download() {
    let ws = Workspace::new();
    ws.write("uncharacterized_hits.txt", HITS);
    ws.write_config(None);

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "OK", ""));
    let paths = ws.batch_paths();
    let result = app.run_batch(&paths);

    assert_matches!(
        result,
        Err(PipelineError::ConfigFieldMissing("seed_protein_file"))
    );
    let calls = app.alphafold().calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "AF-P69905-F1-model_v4.pdb".to_string(),
            "AF-Q9XYZ1-F1-model_v4.pdb".to_string(),
        ]
    );
    assert!(app.command_runner().seen.lock().unwrap().is_empty());
    assert!(!paths.result_log.as_std_path().exists());
}

#[test]
fn missing_config_file_is_fatal() {
    let ws = Workspace::new();
    ws.write("uncharacterized_hits.txt", HITS);

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "OK", ""));
    assert_matches!(
        app.run_batch(&ws.batch_paths()),
        Err(PipelineError::ConfigMissing(_))
    );
}

#[test]
fn missing_hits_file_aborts_before_any_download() {
    let ws = Workspace::new();
    ws.write_config(Some("seed.pdb"));

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "OK", ""));
    assert_matches!(
        app.run_batch(&ws.batch_paths()),
        Err(PipelineError::MissingInput(_))
    );
    assert!(app.alphafold().calls.lock().unwrap().is_empty());
}

#[test]
fn seed_stage_downloads_seed_and_rewrites_config() {
    let ws = Workspace::new();
    ws.write("query_seed_accession.txt", "Q9XYZ1\n");
    ws.write_config(Some("old_seed.pdb"));

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "", ""));
    let paths = ws.seed_paths();
    let report = app.select_seed(&paths).unwrap();

    let expected = paths.structures_dir.join("AF-Q9XYZ1-F1-model_v4.pdb");
    assert_eq!(report.seed_path, expected);
    assert_eq!(report.seed_path.file_name(), Some("AF-Q9XYZ1-F1-model_v4.pdb"));
    assert_eq!(report.seed_status, FetchStatus::Downloaded);
    assert!(expected.as_std_path().exists());
    assert_eq!(
        *app.alphafold().calls.lock().unwrap(),
        vec!["AF-Q9XYZ1-F1-model_v4.pdb".to_string()]
    );

    let config = ConfigStore::load(&paths.config).unwrap().into_settings();
    assert_eq!(config.active_site.unwrap().to_string(), "1,2,3");
    assert_eq!(config.seed_protein_file.as_deref(), Some(expected.as_str()));
    assert!(config.kv_finder);
    assert!(ws.read(&paths.config).contains("\n    \"active_site\": \"1,2,3\""));
}

#[test]
fn seed_stage_requires_accession_file() {
    let ws = Workspace::new();
    ws.write_config(None);

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "", ""));
    assert_matches!(
        app.select_seed(&ws.seed_paths()),
        Err(PipelineError::MissingInput(_))
    );
    assert!(app.alphafold().calls.lock().unwrap().is_empty());
}

#[test]
fn seed_stage_then_batch_stage() {
    let ws = Workspace::new();
    ws.write("query_seed_accession.txt", "Q9XYZ1");
    ws.write("uncharacterized_hits.txt", HITS);
    ws.write_config(None);

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "done", ""));
    app.select_seed(&ws.seed_paths()).unwrap();
    let report = app.run_batch(&ws.batch_paths()).unwrap();

    assert_eq!(report.seed_status, FetchStatus::Cached);
    let a_index = report.command.iter().position(|token| token == "-a").unwrap();
    assert_eq!(report.command[a_index + 1], "1,2,3");
    // Q9XYZ1 was fetched once by the seed stage and reused afterwards.
    let calls = app.alphafold().calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
}

#[test]
fn unavailable_seed_aborts_before_actseek_runs() {
    let ws = Workspace::new();
    ws.write("uncharacterized_hits.txt", HITS);
    let seed = ws.root.join("structures").join("AF-B2RXH2-F1-model_v4.pdb");
    ws.write_config(Some(seed.as_str()));

    let app = App::new(
        MockAlphaFold::without("AF-B2RXH2-F1-model_v4.pdb"),
        MockRunner::exiting(0, "OK", ""),
    );
    let paths = ws.batch_paths();

    assert_matches!(
        app.run_batch(&paths),
        Err(PipelineError::AlphaFoldStatus { status: 404, .. })
    );
    assert_eq!(app.alphafold().calls.lock().unwrap().len(), 3);
    assert!(app.command_runner().seen.lock().unwrap().is_empty());
    assert!(!paths.result_log.as_std_path().exists());
    assert!(!seed.as_std_path().exists());
    assert_eq!(ws.read(&paths.manifest), "P69905\nQ9XYZ1\n");
}

#[test]
fn unavailable_seed_leaves_config_untouched() {
    let ws = Workspace::new();
    ws.write("query_seed_accession.txt", "B2RXH2\n");
    ws.write_config(Some("old_seed.pdb"));
    let paths = ws.seed_paths();
    let before = ws.read(&paths.config);

    let app = App::new(
        MockAlphaFold::without("AF-B2RXH2-F1-model_v4.pdb"),
        MockRunner::exiting(0, "", ""),
    );

    assert_matches!(
        app.select_seed(&paths),
        Err(PipelineError::AlphaFoldStatus { status: 404, .. })
    );
    assert_eq!(ws.read(&paths.config), before);
    assert!(!paths
        .structures_dir
        .join("AF-B2RXH2-F1-model_v4.pdb")
        .as_std_path()
        .exists());
}

#[test]
fn seed_stage_preserves_config_layout() {
    let ws = Workspace::new();
    ws.write("query_seed_accession.txt", "Q9XYZ1");
    ws.write(
        "config.json",
        r#"{"path_results": "results", "threshold": null, "active_site": "10,57", "seed_protein_file": "old.pdb", "lab_notes": "v2"}"#,
    );
    let paths = ws.seed_paths();

    let app = App::new(MockAlphaFold::default(), MockRunner::exiting(0, "", ""));
    let report = app.select_seed(&paths).unwrap();

    let expected = format!(
        "{{\n    \"path_results\": \"results\",\n    \"threshold\": null,\n    \"active_site\": \"1,2,3\",\n    \"seed_protein_file\": \"{}\",\n    \"lab_notes\": \"v2\"\n}}",
        report.seed_path
    );
    assert_eq!(ws.read(&paths.config), expected);
}
