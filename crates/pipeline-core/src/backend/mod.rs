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

pub mod http;

pub use http::HttpBackend;

use crate::dataset::DatasetFile;
use async_trait::async_trait;
use pipeline_contracts::{
    Acknowledgement, DatasetSummary, HealthStatus, ModelKind, PipelineResult,
    PreprocessingConfig, SplitRatio, TrainingResult,
};
use std::sync::Arc;

/// The compute service the wizard drives. One method per endpoint; each call
/// is exactly one round trip with no retries.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    async fn upload(&self, file: &DatasetFile) -> PipelineResult<DatasetSummary>;

    async fn preprocess(&self, config: PreprocessingConfig) -> PipelineResult<Acknowledgement>;

    async fn split(&self, ratio: SplitRatio) -> PipelineResult<Acknowledgement>;

    async fn train(&self, model: ModelKind) -> PipelineResult<TrainingResult>;

    async fn reset(&self) -> PipelineResult<()>;

    async fn health(&self) -> PipelineResult<HealthStatus>;
}

#[async_trait]
impl<T: PipelineBackend + ?Sized> PipelineBackend for Arc<T> {
    async fn upload(&self, file: &DatasetFile) -> PipelineResult<DatasetSummary> {
        (**self).upload(file).await
    }

    async fn preprocess(&self, config: PreprocessingConfig) -> PipelineResult<Acknowledgement> {
        (**self).preprocess(config).await
    }

    async fn split(&self, ratio: SplitRatio) -> PipelineResult<Acknowledgement> {
        (**self).split(ratio).await
    }

    async fn train(&self, model: ModelKind) -> PipelineResult<TrainingResult> {
        (**self).train(model).await
    }

    async fn reset(&self) -> PipelineResult<()> {
        (**self).reset().await
    }

    async fn health(&self) -> PipelineResult<HealthStatus> {
        (**self).health().await
    }
}
