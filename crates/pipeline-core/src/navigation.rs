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

use crate::state::{PipelineState, WizardStep};

/// Highest step the user has legitimately unlocked.
///
/// The split ratio always holds a value, so reaching the split screen
/// (`preprocessing_applied`) stands in for choosing a ratio. An applied split
/// unlocks the model step even before a model is picked; picking one alone
/// would leave a user who backed out of the model screen unable to return.
pub fn max_reachable_step(state: &PipelineState) -> WizardStep {
    if state.result().is_some() {
        WizardStep::Results
    } else if state.model().is_some() || state.split_applied() {
        WizardStep::Model
    } else if state.preprocessing_applied() {
        WizardStep::Split
    } else if state.dataset().is_some() {
        WizardStep::Preprocess
    } else {
        WizardStep::Upload
    }
}

/// Resolves a requested step number to a permitted target, if any.
pub fn navigation_target(state: &PipelineState, requested: u8) -> Option<WizardStep> {
    WizardStep::from_number(requested).filter(|step| *step <= max_reachable_step(state))
}

/// Steps shown as completed by a step indicator.
pub fn completed_steps(state: &PipelineState) -> Vec<WizardStep> {
    let current = state.current_step();
    WizardStep::ALL
        .into_iter()
        .filter(|step| match step {
            WizardStep::Upload => state.dataset().is_some(),
            WizardStep::Results => state.result().is_some(),
            _ => current > *step,
        })
        .collect()
}
