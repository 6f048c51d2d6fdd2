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

use crate::state::WizardStep;
use pipeline_contracts::{PipelineAction, PipelineError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const QUIET_FILTER: &str = "info,reqwest=warn,hyper=warn,h2=warn,hyper_util=warn,rustls=warn";
const DEBUG_FILTER: &str = "debug,reqwest=info,hyper=info,h2=info,hyper_util=info,rustls=info";

/// Installs the fmt subscriber. `RUST_LOG` is honoured in debug mode.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEBUG_FILTER))
    } else {
        EnvFilter::new(QUIET_FILTER)
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn log_transition(action: &str, from: WizardStep, to: WizardStep) {
    info!(
        action = action,
        from = from.number(),
        to = to.number(),
        "Pipeline transition"
    );
}

pub fn log_action_failure(action: &str, error: &PipelineError) {
    warn!(
        action = action,
        error = %error,
        message = %error.user_message(),
        "Pipeline action failed"
    );
}

pub fn log_discarded_response(action: PipelineAction, issued_in: u64, current: u64) {
    debug!(
        action = %action,
        issued_in = issued_in,
        current = current,
        "Discarding response from a superseded request"
    );
}

pub fn log_abandoned_request(action: PipelineAction, generation: u64) {
    warn!(
        action = %action,
        generation = generation,
        "Request dropped before completion; clearing loading state"
    );
}

pub fn log_rejected_while_busy(action: &str) {
    warn!(action = action, "Rejected action while a request is in flight");
}
