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

mod args;
mod render;

use anyhow::{anyhow, Context, Result};
use args::{Cli, Commands, RunArgs};
use clap::Parser;
use pipeline_core::backend::PipelineBackend;
use pipeline_core::logging::init_tracing;
use pipeline_core::{
    http_orchestrator, DatasetFile, HttpBackend, PipelineOrchestrator, PipelineResult,
};
use tracing::info;

type Wizard = PipelineOrchestrator<HttpBackend>;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = cli.backend_config()?;
    info!(base_url = %config.base_url, "Using pipeline backend");
    let wizard = http_orchestrator(config).context("Failed to create backend client")?;

    match cli.command {
        Commands::Run(args) => run(&wizard, args).await,
        Commands::Health => {
            let health = wizard
                .backend()
                .health()
                .await
                .context("Health check failed")?;
            println!("Backend status: {}", health.status);
            if health.is_healthy() {
                Ok(())
            } else {
                Err(anyhow!("Backend reported status '{}'", health.status))
            }
        }
        Commands::Reset => {
            wizard.reset().await;
            println!("Pipeline reset");
            Ok(())
        }
    }
}

async fn run(wizard: &Wizard, args: RunArgs) -> Result<()> {
    let file = DatasetFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let dataset = advance(wizard, wizard.upload(file).await)?;
    print!("{}", render::dataset_summary(&dataset));

    advance(wizard, wizard.set_scaling(args.scaling).await)?;
    advance(wizard, wizard.apply_preprocessing().await)?;

    advance(wizard, wizard.set_split_ratio(args.split).await)?;
    advance(wizard, wizard.apply_split().await)?;

    advance(wizard, wizard.select_model(args.model).await)?;
    let result = advance(wizard, wizard.train().await)?;

    println!();
    print!("{}", render::results_table(&result));
    Ok(())
}

/// Prints the step indicator after each action, or turns the failure into the
/// message the pipeline recorded for it.
fn advance<T>(wizard: &Wizard, outcome: PipelineResult<T>) -> Result<T> {
    let state = wizard.state();
    match outcome {
        Ok(value) => {
            println!("{}", render::step_indicator(&state));
            Ok(value)
        }
        Err(error) => {
            let message = state
                .error()
                .map_or_else(|| error.user_message(), str::to_string);
            Err(anyhow!(message).context(format!("Stopped at step {}", state.current_step())))
        }
    }
}
