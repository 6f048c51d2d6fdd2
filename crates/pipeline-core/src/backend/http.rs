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

use super::PipelineBackend;
use crate::dataset::DatasetFile;
use async_trait::async_trait;
use pipeline_contracts::{
    Acknowledgement, BackendConfig, DatasetSummary, ErrorBody, HealthStatus, ModelKind,
    PipelineAction, PipelineError, PipelineResult, PreprocessingConfig, SplitRatio,
    SplitRequest, TrainRequest, TrainingResult,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> PipelineResult<Self> {
        config.validate()?;

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().map_err(|e| {
            PipelineError::Configuration(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn post(&self, action: PipelineAction) -> RequestBuilder {
        self.client.post(self.config.endpoint(action))
    }

    async fn send(&self, action: PipelineAction, request: RequestBuilder) -> PipelineResult<Response> {
        debug!(action = %action, "Sending request to pipeline backend");

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(action, &e))?;
        let status = response.status();
        debug!(action = %action, status = %status, "Received response from pipeline backend");

        if status.is_success() {
            Ok(response)
        } else {
            Err(rejection(action, response).await)
        }
    }
}

fn transport_error(action: PipelineAction, error: &reqwest::Error) -> PipelineError {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("backend unreachable: {error}")
    } else {
        error.to_string()
    };
    PipelineError::Transport { action, reason }
}

async fn rejection(action: PipelineAction, response: Response) -> PipelineError {
    let status = response.status().as_u16();
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail_message()),
        Err(e) => {
            debug!(action = %action, error = %e, "Failed to read error body");
            None
        }
    };
    PipelineError::Backend {
        action,
        status,
        detail,
    }
}

async fn read_json<T: DeserializeOwned>(action: PipelineAction, response: Response) -> PipelineResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(action, &e))?;
    serde_json::from_slice(&body).map_err(|e| PipelineError::MalformedResponse {
        action,
        reason: e.to_string(),
    })
}

/// Acknowledgements may be empty or free-form; only an explicit
/// `"success": false` counts against the request.
async fn read_acknowledgement(
    action: PipelineAction,
    response: Response,
) -> PipelineResult<Acknowledgement> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(action, &e))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Acknowledgement::default());
    }

    let ack = match serde_json::from_slice::<Acknowledgement>(&body) {
        Ok(ack) => ack,
        Err(e) => {
            debug!(action = %action, error = %e, "Ignoring unstructured acknowledgement body");
            return Ok(Acknowledgement::default());
        }
    };

    if ack.success == Some(false) {
        return Err(PipelineError::Backend {
            action,
            status,
            detail: ack.message,
        });
    }
    if let Some(message) = &ack.message {
        info!(action = %action, message = %message, "Backend acknowledged request");
    }
    Ok(ack)
}

#[async_trait]
impl PipelineBackend for HttpBackend {
    async fn upload(&self, file: &DatasetFile) -> PipelineResult<DatasetSummary> {
        let action = PipelineAction::Upload;
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.file_name().to_string())
            .mime_str(file.mime_type())
            .map_err(|e| PipelineError::Validation(format!("Invalid upload content type: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self.send(action, self.post(action).multipart(form)).await?;
        read_json(action, response).await
    }

    async fn preprocess(&self, config: PreprocessingConfig) -> PipelineResult<Acknowledgement> {
        let action = PipelineAction::Preprocess;
        let response = self.send(action, self.post(action).json(&config)).await?;
        read_acknowledgement(action, response).await
    }

    async fn split(&self, ratio: SplitRatio) -> PipelineResult<Acknowledgement> {
        let action = PipelineAction::Split;
        let response = self
            .send(action, self.post(action).json(&SplitRequest { ratio }))
            .await?;
        read_acknowledgement(action, response).await
    }

    async fn train(&self, model: ModelKind) -> PipelineResult<TrainingResult> {
        let action = PipelineAction::Train;
        let response = self
            .send(action, self.post(action).json(&TrainRequest { model }))
            .await?;
        let result: TrainingResult = read_json(action, response).await?;
        result
            .validate()
            .map_err(|reason| PipelineError::MalformedResponse { action, reason })?;
        Ok(result)
    }

    async fn reset(&self) -> PipelineResult<()> {
        let action = PipelineAction::Reset;
        self.send(action, self.post(action)).await?;
        Ok(())
    }

    async fn health(&self) -> PipelineResult<HealthStatus> {
        let action = PipelineAction::Health;
        let request = self.client.get(self.config.endpoint(action));
        let response = self.send(action, request).await?;
        read_json(action, response).await
    }
}
