// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pipeline_core::config::{layered_config, API_URL_ENV, TIMEOUT_ENV};
use pipeline_core::{BackendConfig, ModelKind, Scaling, SplitRatio};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "pipeline-wizard")]
#[command(
    about = "Guided five-step model training against a compute backend: upload, preprocess, split, model, results."
)]
pub struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Backend base URL; overrides PIPELINE_API_URL and the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// TOML file with base_url, timeout_seconds and user_agent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every wizard step for one dataset.
    Run(RunArgs),

    Health,

    /// Ask the backend to drop its session.
    Reset,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long, default_value = "none")]
    pub scaling: Scaling,

    #[arg(long, default_value = "80-20")]
    pub split: SplitRatio,

    #[arg(long)]
    pub model: ModelKind,
}

impl Cli {
    pub fn backend_config(&self) -> Result<BackendConfig> {
        self.backend_config_from(|key| std::env::var(key).ok())
    }

    /// Flags win over the environment, which is not consulted for a value a
    /// flag already provides. Validation runs once, on the merged result.
    fn backend_config_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<BackendConfig> {
        let lookup = |key: &str| match key {
            API_URL_ENV if self.api_url.is_some() => None,
            TIMEOUT_ENV if self.timeout.is_some() => None,
            _ => lookup(key),
        };
        let mut config = layered_config(self.config.as_deref(), lookup)
            .context("Failed to load backend configuration")?;
        if let Some(url) = &self.api_url {
            config.base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        config
            .validate()
            .context("Invalid backend configuration")?;
        Ok(config)
    }
}
