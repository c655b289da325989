pub mod alphafold;
pub mod app;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fs_util;
pub mod manifest;
pub mod output;
pub mod runner;
