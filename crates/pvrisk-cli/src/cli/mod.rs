// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVRisk.

//! CLI module for the pvrisk command line.

pub mod args;
pub mod config;
pub mod formatters;
pub mod validation;

pub use args::{CatalogArgs, Cli, Commands, ListArgs, OutputFormat, RunArgs};
pub use config::{AppConfig, ConfigSource};
pub use formatters::{CsvFormatter, JsonFormatter, TableFormatter, series_rows};
