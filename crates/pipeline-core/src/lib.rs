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

pub mod backend;
pub mod config;
pub mod dataset;
pub mod logging;
pub mod navigation;
pub mod orchestrator;
pub mod state;

pub use backend::{HttpBackend, PipelineBackend};
pub use config::load_backend_config;
pub use dataset::{DatasetFile, ACCEPTED_EXTENSIONS};
pub use navigation::{completed_steps, max_reachable_step, navigation_target};
pub use orchestrator::PipelineOrchestrator;
pub use state::{PipelineState, WizardStep};

pub use pipeline_contracts::{
    AccuracyGrade, BackendConfig, DatasetSummary, ModelKind, PipelineAction, PipelineError,
    PipelineResult, PreprocessingConfig, Scaling, SplitRatio, TrainingResult,
};

/// Orchestrator wired to the HTTP backend described by `config`.
pub fn http_orchestrator(config: BackendConfig) -> PipelineResult<PipelineOrchestrator<HttpBackend>> {
    Ok(PipelineOrchestrator::new(HttpBackend::new(config)?))
}
