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

use pipeline_contracts::{
    DatasetSummary, ModelKind, PreprocessingConfig, Scaling, SplitRatio, TrainingResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    #[default]
    Upload = 1,
    Preprocess = 2,
    Split = 3,
    Model = 4,
    Results = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Upload,
        WizardStep::Preprocess,
        WizardStep::Split,
        WizardStep::Model,
        WizardStep::Results,
    ];

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Upload => "Upload",
            WizardStep::Preprocess => "Preprocess",
            WizardStep::Split => "Split",
            WizardStep::Model => "Model",
            WizardStep::Results => "Results",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        WizardStep::from_number(number).ok_or_else(|| format!("step {number} is outside 1..=5"))
    }
}

/// Snapshot of wizard progress. Only the orchestrator builds new states; every
/// transition below consumes the previous snapshot and returns its successor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    current_step: WizardStep,
    dataset: Option<DatasetSummary>,
    scaling: Scaling,
    split_ratio: SplitRatio,
    model: Option<ModelKind>,
    result: Option<TrainingResult>,
    preprocessing_applied: bool,
    split_applied: bool,
    is_loading: bool,
    error: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::Upload,
            dataset: None,
            scaling: Scaling::None,
            split_ratio: SplitRatio::EightyTwenty,
            model: None,
            result: None,
            preprocessing_applied: false,
            split_applied: false,
            is_loading: false,
            error: None,
        }
    }
}

impl PipelineState {
    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn dataset(&self) -> Option<&DatasetSummary> {
        self.dataset.as_ref()
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn preprocessing(&self) -> PreprocessingConfig {
        self.scaling.to_config()
    }

    pub fn split_ratio(&self) -> SplitRatio {
        self.split_ratio
    }

    pub fn model(&self) -> Option<ModelKind> {
        self.model
    }

    pub fn result(&self) -> Option<&TrainingResult> {
        self.result.as_ref()
    }

    pub fn preprocessing_applied(&self) -> bool {
        self.preprocessing_applied
    }

    pub fn split_applied(&self) -> bool {
        self.split_applied
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn loading(self) -> Self {
        Self {
            is_loading: true,
            error: None,
            ..self
        }
    }

    /// Stops loading without recording an outcome.
    pub(crate) fn idle(self) -> Self {
        Self {
            is_loading: false,
            ..self
        }
    }

    pub(crate) fn failed(self, message: String) -> Self {
        Self {
            is_loading: false,
            error: Some(message),
            ..self
        }
    }

    /// A fresh run: everything from the previous dataset is dropped.
    pub(crate) fn uploaded(dataset: DatasetSummary) -> Self {
        Self {
            current_step: WizardStep::Preprocess,
            dataset: Some(dataset),
            ..Self::default()
        }
    }

    pub(crate) fn preprocessing_done(self) -> Self {
        Self {
            current_step: WizardStep::Split,
            preprocessing_applied: true,
            is_loading: false,
            error: None,
            ..self
        }
    }

    pub(crate) fn split_done(self) -> Self {
        Self {
            current_step: WizardStep::Model,
            split_applied: true,
            is_loading: false,
            error: None,
            ..self
        }
    }

    pub(crate) fn trained(self, result: TrainingResult) -> Self {
        Self {
            current_step: WizardStep::Results,
            result: Some(result),
            is_loading: false,
            error: None,
            ..self
        }
    }

    pub(crate) fn with_scaling(self, scaling: Scaling) -> Self {
        Self {
            scaling,
            error: None,
            ..self
        }
    }

    pub(crate) fn with_split_ratio(self, split_ratio: SplitRatio) -> Self {
        Self {
            split_ratio,
            error: None,
            ..self
        }
    }

    pub(crate) fn with_model(self, model: ModelKind) -> Self {
        Self {
            model: Some(model),
            error: None,
            ..self
        }
    }

    pub(crate) fn at_step(self, current_step: WizardStep) -> Self {
        Self {
            current_step,
            error: None,
            ..self
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn iris_summary() -> DatasetSummary {
        serde_json::from_value(json!({
            "filename": "iris.csv",
            "rows": 150,
            "columns": ["sepal_length", "sepal_width", "petal_length", "petal_width", "species"],
            "numericColumns": ["sepal_length", "sepal_width", "petal_length", "petal_width"],
            "preview": [],
        }))
        .unwrap()
    }

    pub(crate) fn sample_result() -> TrainingResult {
        TrainingResult {
            accuracy: 0.93,
            confusion_matrix: vec![vec![15, 0, 0], vec![0, 13, 2], vec![0, 1, 14]],
            class_labels: vec!["setosa".into(), "versicolor".into(), "virginica".into()],
            model_name: "decision_tree".into(),
            train_size: 105,
            test_size: 45,
        }
    }

    #[test]
    fn test_step_numbers_are_bounded() {
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
        for (index, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(usize::from(step.number()), index + 1);
            assert_eq!(WizardStep::from_number(step.number()), Some(*step));
        }
        assert_eq!(WizardStep::Split.to_string(), "3. Split");
    }

    #[test]
    fn test_initial_state_defaults() {
        let state = PipelineState::default();
        assert_eq!(state.current_step(), WizardStep::Upload);
        assert!(state.dataset().is_none());
        assert_eq!(
            state.preprocessing(),
            PreprocessingConfig {
                standardization: false,
                normalization: false
            }
        );
        assert_eq!(state.split_ratio(), SplitRatio::EightyTwenty);
        assert!(state.model().is_none());
        assert!(state.result().is_none());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_upload_clears_downstream_choices() {
        let stale = PipelineState::uploaded(iris_summary())
            .with_scaling(Scaling::Normalization)
            .preprocessing_done()
            .with_split_ratio(SplitRatio::SeventyThirty)
            .split_done()
            .with_model(ModelKind::LogisticRegression)
            .trained(sample_result());

        let fresh = PipelineState::uploaded(iris_summary());
        assert_eq!(stale.current_step(), WizardStep::Results);
        assert_eq!(fresh.current_step(), WizardStep::Preprocess);
        assert_eq!(fresh.scaling(), Scaling::None);
        assert_eq!(fresh.split_ratio(), SplitRatio::EightyTwenty);
        assert!(fresh.model().is_none());
        assert!(fresh.result().is_none());
        assert!(!fresh.preprocessing_applied());
    }

    #[test]
    fn test_loading_and_failure_flags() {
        let state = PipelineState::default()
            .failed("old".to_string())
            .loading();
        assert!(state.is_loading());
        assert!(state.error().is_none());

        let failed = state.failed("Failed to upload dataset".to_string());
        assert!(!failed.is_loading());
        assert_eq!(failed.error(), Some("Failed to upload dataset"));
        assert_eq!(failed.current_step(), WizardStep::Upload);

        let abandoned = PipelineState::uploaded(iris_summary()).loading().idle();
        assert!(!abandoned.is_loading());
        assert!(abandoned.error().is_none());
        assert_eq!(abandoned.current_step(), WizardStep::Preprocess);
    }

    #[test]
    fn test_state_serializes_step_as_number() {
        let value = serde_json::to_value(PipelineState::uploaded(iris_summary())).unwrap();
        assert_eq!(value["currentStep"], json!(2));
        assert_eq!(value["splitRatio"], json!("80-20"));
        assert_eq!(value["dataset"]["rows"], json!(150));
    }
}
