use std::fmt;

use serde::Serialize;

use crate::config::{Config, ConfigScalar};
use crate::error::PipelineError;

pub const DEFAULT_ACTSEEK_PROGRAM: &str = "actseek";

/// One ActSeek batch invocation: program plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BatchCommand {
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.args.len() + 1);
        tokens.push(self.program.clone());
        tokens.extend(self.args.iter().cloned());
        tokens
    }
}

impl fmt::Display for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens().join(" "))
    }
}

pub struct BatchCommandBuilder;

impl BatchCommandBuilder {
    pub fn build(program: &str, config: &Config) -> Result<BatchCommand, PipelineError> {
        let mut args = Vec::new();
        push_flag(&mut args, "-a", scalar(&config.active_site, "active_site")?);
        push_flag(&mut args, "-sa", scalar(&config.selected_active, "selected_active")?);
        push_flag(&mut args, "-g", grouping(config)?);
        push_flag(&mut args, "-r", scalar(&config.random_seed, "random_seed")?);
        push_flag(&mut args, "-t1", scalar(&config.threshold, "threshold")?);
        push_flag(
            &mut args,
            "-t1c",
            scalar(&config.threshold_combinations, "threshold_combinations")?,
        );
        push_flag(&mut args, "-t2", scalar(&config.aa_surrounding, "aa_surrounding")?);
        push_flag(
            &mut args,
            "-t2t",
            scalar(&config.aa_surrounding_threshold, "aa_surrounding_threshold")?,
        );
        push_flag(&mut args, "-t3", scalar(&config.threshold_others, "threshold_others")?);
        push_flag(&mut args, "-i", scalar(&config.iterations, "iterations")?);
        push_flag(&mut args, "-f", scalar(&config.first_in_file, "first_in_file")?);
        push_flag(&mut args, "-m", scalar(&config.max_protein, "max_protein")?);
        push_flag(&mut args, "-s", text(&config.protein_file, "protein_file")?);
        push_flag(
            &mut args,
            "-af",
            text(&config.alphafold_proteins_path, "alphafold_proteins_path")?,
        );
        push_flag(&mut args, "-p", config.validate_seed()?.into_string());
        push_flag(&mut args, "-pr", text(&config.path_results, "path_results")?);

        for (enabled, flag) in [
            (config.delete_protein_files, "-d"),
            (config.kv_finder, "-kv"),
            (config.custom, "-c"),
        ] {
            if enabled {
                args.push(flag.to_string());
            }
        }

        Ok(BatchCommand {
            program: program.to_string(),
            args,
        })
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: String) {
    args.push(flag.to_string());
    args.push(value);
}

// ActSeek reads the grouping back with a JSON parser, so it travels as one token.
fn grouping(config: &Config) -> Result<String, PipelineError> {
    let grouping = config
        .aa_grouping
        .as_ref()
        .ok_or(PipelineError::ConfigFieldMissing("aa_grouping"))?;
    serde_json::to_string(grouping).map_err(|err| PipelineError::ConfigEncode(err.to_string()))
}

fn scalar(value: &Option<ConfigScalar>, key: &'static str) -> Result<String, PipelineError> {
    value
        .as_ref()
        .map(ToString::to_string)
        .ok_or(PipelineError::ConfigFieldMissing(key))
}

fn text(value: &Option<String>, key: &'static str) -> Result<String, PipelineError> {
    value.clone().ok_or(PipelineError::ConfigFieldMissing(key))
}
