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

use crate::backend::PipelineBackend;
use crate::dataset::DatasetFile;
use crate::logging::{
    log_abandoned_request, log_action_failure, log_discarded_response, log_rejected_while_busy,
    log_transition,
};
use crate::navigation::{max_reachable_step, navigation_target};
use crate::state::{PipelineState, WizardStep};
use pipeline_contracts::{
    DatasetSummary, ModelKind, PipelineAction, PipelineError, PipelineResult,
    PreprocessingConfig, Scaling, SplitRatio, TrainingResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Owns the wizard state and mediates every backend call.
///
/// State is published through a watch channel and replaced wholesale on each
/// transition. Transitions are serialised by the transition lock, which is
/// never held across a network call. At most one backend request is in
/// flight; a response that lands after `reset` belongs to an older generation
/// and is dropped. Dropping an action future mid-request clears the loading
/// flag, so cancellation never wedges the pipeline.
pub struct PipelineOrchestrator<B> {
    backend: B,
    state: watch::Sender<PipelineState>,
    transitions: Mutex<()>,
    generation: AtomicU64,
}

/// The in-flight request started by `begin`. Unless `finish` settles it,
/// dropping it stops the loading it started.
struct InFlight<'a> {
    action: PipelineAction,
    generation: u64,
    current_generation: &'a AtomicU64,
    state: &'a watch::Sender<PipelineState>,
    settled: bool,
}

impl InFlight<'_> {
    fn current(&self) -> u64 {
        self.current_generation.load(Ordering::SeqCst)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let generation = self.generation;
        let current_generation = self.current_generation;
        // A reset since `begin` owns the state now, including any newer request.
        let cleared = self.state.send_if_modified(|state| {
            if !state.is_loading() || current_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = state.clone().idle();
            true
        });
        if cleared {
            log_abandoned_request(self.action, generation);
        }
    }
}

impl<B: PipelineBackend> PipelineOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(PipelineState::default());
        Self {
            backend,
            state,
            transitions: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Receiver woken on every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn max_reachable_step(&self) -> WizardStep {
        max_reachable_step(&self.state.borrow())
    }

    pub async fn upload(&self, file: DatasetFile) -> PipelineResult<DatasetSummary> {
        let (ticket, ()) = self
            .begin(PipelineAction::Upload, |_| file.validate())
            .await?;
        let outcome = self.backend.upload(&file).await;
        self.finish(
            ticket,
            outcome,
            |_, dataset| PipelineState::uploaded(dataset.clone()),
            // The backend drops its session before parsing, so a failed upload
            // leaves nothing to return to.
            |_, message| PipelineState::default().failed(message),
        )
        .await
    }

    pub async fn configure_preprocessing(
        &self,
        config: PreprocessingConfig,
    ) -> PipelineResult<Scaling> {
        let next = self
            .update_local("configure_preprocessing", |state| {
                let scaling = Scaling::resolve(state.scaling(), config);
                state.with_scaling(scaling)
            })
            .await?;
        Ok(next.scaling())
    }

    pub async fn set_scaling(&self, scaling: Scaling) -> PipelineResult<()> {
        self.update_local("set_scaling", |state| state.with_scaling(scaling))
            .await
            .map(|_| ())
    }

    pub async fn apply_preprocessing(&self) -> PipelineResult<()> {
        let (ticket, config) = self
            .begin(PipelineAction::Preprocess, |state| {
                require_dataset(state, "applying preprocessing")?;
                Ok(state.preprocessing())
            })
            .await?;
        let outcome = self.backend.preprocess(config).await;
        self.finish(
            ticket,
            outcome,
            |state, _| state.preprocessing_done(),
            PipelineState::failed,
        )
        .await
        .map(|_| ())
    }

    pub async fn set_split_ratio(&self, ratio: SplitRatio) -> PipelineResult<()> {
        self.update_local("set_split_ratio", |state| state.with_split_ratio(ratio))
            .await
            .map(|_| ())
    }

    pub async fn apply_split(&self) -> PipelineResult<()> {
        let (ticket, ratio) = self
            .begin(PipelineAction::Split, |state| {
                require_dataset(state, "splitting data")?;
                Ok(state.split_ratio())
            })
            .await?;
        let outcome = self.backend.split(ratio).await;
        self.finish(
            ticket,
            outcome,
            |state, ack| {
                if let (Some(train), Some(test)) = (ack.train_size, ack.test_size) {
                    debug!(train_size = train, test_size = test, "Backend split sizes");
                }
                state.split_done()
            },
            PipelineState::failed,
        )
        .await
        .map(|_| ())
    }

    pub async fn select_model(&self, model: ModelKind) -> PipelineResult<()> {
        self.update_local("select_model", |state| state.with_model(model))
            .await
            .map(|_| ())
    }

    pub async fn train(&self) -> PipelineResult<TrainingResult> {
        let (ticket, model) = self
            .begin(PipelineAction::Train, |state| {
                let model = state.model().ok_or_else(|| {
                    PipelineError::Validation("Select a model before training".to_string())
                })?;
                require_dataset(state, "training")?;
                Ok(model)
            })
            .await?;
        let outcome = self.backend.train(model).await;
        self.finish(
            ticket,
            outcome,
            |state, result| state.trained(result.clone()),
            PipelineState::failed,
        )
        .await
    }

    /// Moves to `requested` if it is within the reachable ceiling. Returns
    /// whether the navigation was accepted; rejected requests change nothing.
    pub async fn go_to_step(&self, requested: u8) -> bool {
        let _transition = self.transitions.lock().await;
        let current = self.state();
        if current.is_loading() {
            debug!(requested = requested, "Ignoring navigation while loading");
            return false;
        }

        let Some(target) = navigation_target(&current, requested) else {
            debug!(
                requested = requested,
                ceiling = max_reachable_step(&current).number(),
                "Ignoring navigation beyond the reachable step"
            );
            return false;
        };

        let next = current.clone().at_step(target);
        if next != current {
            log_transition("go_to_step", current.current_step(), target);
            self.state.send_replace(next);
        }
        true
    }

    /// Returns to the initial state, then tells the backend to drop its
    /// session. The notification's outcome is only logged.
    pub async fn reset(&self) {
        {
            let _transition = self.transitions.lock().await;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            info!(generation = generation, "Resetting pipeline");
            self.state.send_replace(PipelineState::default());
        }

        if let Err(error) = self.backend.reset().await {
            warn!(error = %error, "Backend reset notification failed");
        }
    }

    async fn begin<P>(
        &self,
        action: PipelineAction,
        prepare: impl FnOnce(&PipelineState) -> PipelineResult<P>,
    ) -> PipelineResult<(InFlight<'_>, P)> {
        let _transition = self.transitions.lock().await;
        let current = self.state();
        if current.is_loading() {
            log_rejected_while_busy(action.as_str());
            return Err(PipelineError::Busy);
        }

        match prepare(&current) {
            Ok(payload) => {
                self.state.send_replace(current.loading());
                let ticket = InFlight {
                    action,
                    generation: self.generation.load(Ordering::SeqCst),
                    current_generation: &self.generation,
                    state: &self.state,
                    settled: false,
                };
                Ok((ticket, payload))
            }
            Err(error) => {
                log_action_failure(action.as_str(), &error);
                self.state
                    .send_replace(current.failed(error.user_message()));
                Err(error)
            }
        }
    }

    async fn finish<R>(
        &self,
        mut ticket: InFlight<'_>,
        outcome: PipelineResult<R>,
        on_success: impl FnOnce(PipelineState, &R) -> PipelineState,
        on_failure: impl FnOnce(PipelineState, String) -> PipelineState,
    ) -> PipelineResult<R> {
        let _transition = self.transitions.lock().await;
        ticket.settled = true;
        let current_generation = ticket.current();
        if current_generation != ticket.generation {
            log_discarded_response(ticket.action, ticket.generation, current_generation);
            return Err(PipelineError::Superseded);
        }

        let current = self.state();
        let from = current.current_step();
        match outcome {
            Ok(value) => {
                let next = on_success(current, &value);
                log_transition(ticket.action.as_str(), from, next.current_step());
                self.state.send_replace(next);
                Ok(value)
            }
            Err(error) => {
                log_action_failure(ticket.action.as_str(), &error);
                self.state
                    .send_replace(on_failure(current, error.user_message()));
                Err(error)
            }
        }
    }

    async fn update_local(
        &self,
        action: &str,
        change: impl FnOnce(PipelineState) -> PipelineState,
    ) -> PipelineResult<PipelineState> {
        let _transition = self.transitions.lock().await;
        let current = self.state();
        if current.is_loading() {
            log_rejected_while_busy(action);
            return Err(PipelineError::Busy);
        }

        let next = change(current);
        debug!(action = action, "Local pipeline update");
        self.state.send_replace(next.clone());
        Ok(next)
    }
}

fn require_dataset(state: &PipelineState, activity: &str) -> PipelineResult<()> {
    if state.dataset().is_none() {
        return Err(PipelineError::Validation(format!(
            "Upload a dataset before {activity}"
        )));
    }
    Ok(())
}
