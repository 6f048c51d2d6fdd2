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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The preprocessing choice. Standardization and normalization are mutually
/// exclusive, so they are a single variant rather than two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    #[default]
    None,
    Standardization,
    Normalization,
}

impl Scaling {
    /// Resolves a requested flag pair against the currently active choice.
    /// When both flags arrive set, the one being enabled wins.
    pub fn resolve(current: Scaling, requested: PreprocessingConfig) -> Scaling {
        match (requested.standardization, requested.normalization) {
            (false, false) => Scaling::None,
            (true, false) => Scaling::Standardization,
            (false, true) => Scaling::Normalization,
            (true, true) => match current {
                Scaling::Standardization => Scaling::Normalization,
                Scaling::Normalization | Scaling::None => Scaling::Standardization,
            },
        }
    }

    pub fn to_config(self) -> PreprocessingConfig {
        PreprocessingConfig {
            standardization: self == Scaling::Standardization,
            normalization: self == Scaling::Normalization,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scaling::None => "none",
            Scaling::Standardization => "standardization",
            Scaling::Normalization => "normalization",
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scaling {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Scaling::None),
            "standardization" | "standardisation" => Ok(Scaling::Standardization),
            "normalization" | "normalisation" => Ok(Scaling::Normalization),
            other => Err(PipelineError::Validation(format!(
                "Unsupported preprocessing option '{other}'"
            ))),
        }
    }
}

/// Wire shape of the preprocessing choice, also the `/preprocess` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    #[serde(default)]
    pub standardization: bool,
    #[serde(default)]
    pub normalization: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SplitRatio {
    #[serde(rename = "70-30")]
    SeventyThirty,
    #[default]
    #[serde(rename = "80-20")]
    EightyTwenty,
}

impl SplitRatio {
    pub const ALL: [SplitRatio; 2] = [SplitRatio::SeventyThirty, SplitRatio::EightyTwenty];

    pub fn as_str(self) -> &'static str {
        match self {
            SplitRatio::SeventyThirty => "70-30",
            SplitRatio::EightyTwenty => "80-20",
        }
    }

    pub fn test_fraction(self) -> f64 {
        match self {
            SplitRatio::SeventyThirty => 0.3,
            SplitRatio::EightyTwenty => 0.2,
        }
    }
}

impl fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitRatio {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SplitRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| PipelineError::Validation(format!("Unsupported split ratio '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    DecisionTree,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::DecisionTree];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::DecisionTree => "decision_tree",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::DecisionTree => "Decision Tree",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|model| model.as_str() == s.trim())
            .ok_or_else(|| PipelineError::Validation(format!("Unsupported model type '{s}'")))
    }
}

/// Backend round trips the wizard can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAction {
    Upload,
    Preprocess,
    Split,
    Train,
    Reset,
    Health,
}

impl PipelineAction {
    pub fn endpoint(self) -> &'static str {
        match self {
            PipelineAction::Upload => "/upload",
            PipelineAction::Preprocess => "/preprocess",
            PipelineAction::Split => "/split",
            PipelineAction::Train => "/train",
            PipelineAction::Reset => "/reset",
            PipelineAction::Health => "/health",
        }
    }

    /// Message shown when the backend gives no usable detail.
    pub fn fallback_message(self) -> &'static str {
        match self {
            PipelineAction::Upload => "Failed to upload dataset",
            PipelineAction::Preprocess => "Failed to apply preprocessing",
            PipelineAction::Split => "Failed to split data",
            PipelineAction::Train => "Failed to train model",
            PipelineAction::Reset => "Failed to reset backend session",
            PipelineAction::Health => "Failed to reach backend",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineAction::Upload => "upload",
            PipelineAction::Preprocess => "preprocess",
            PipelineAction::Split => "split",
            PipelineAction::Train => "train",
            PipelineAction::Reset => "reset",
            PipelineAction::Health => "health",
        }
    }
}

impl fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend rejected {action} with status {status}")]
    Backend {
        action: PipelineAction,
        status: u16,
        detail: Option<String>,
    },

    #[error("Network error during {action}: {reason}")]
    Transport {
        action: PipelineAction,
        reason: String,
    },

    #[error("Malformed {action} response: {reason}")]
    MalformedResponse {
        action: PipelineAction,
        reason: String,
    },

    #[error("A request is already in flight")]
    Busy,

    #[error("Response discarded because the pipeline was reset")]
    Superseded,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// The text stored in the pipeline state's `error` field.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(message) | PipelineError::Configuration(message) => {
                message.clone()
            }
            PipelineError::Backend { action, detail, .. } => detail
                .clone()
                .unwrap_or_else(|| action.fallback_message().to_string()),
            PipelineError::Transport { action, .. }
            | PipelineError::MalformedResponse { action, .. } => {
                action.fallback_message().to_string()
            }
            PipelineError::Io(err) => err.to_string(),
            PipelineError::Busy | PipelineError::Superseded => self.to_string(),
        }
    }

    /// Busy and superseded outcomes are bookkeeping, not user-facing failures.
    pub fn records_in_state(&self) -> bool {
        !matches!(self, PipelineError::Busy | PipelineError::Superseded)
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_resolution_is_exclusive() {
        let both = PreprocessingConfig {
            standardization: true,
            normalization: true,
        };
        assert_eq!(
            Scaling::resolve(Scaling::Standardization, both),
            Scaling::Normalization
        );
        assert_eq!(
            Scaling::resolve(Scaling::Normalization, both),
            Scaling::Standardization
        );
        assert_eq!(Scaling::resolve(Scaling::None, both), Scaling::Standardization);

        for scaling in [
            Scaling::None,
            Scaling::Standardization,
            Scaling::Normalization,
        ] {
            let config = scaling.to_config();
            assert!(!(config.standardization && config.normalization));
            assert_eq!(Scaling::resolve(Scaling::None, config), scaling);
        }
    }

    #[test]
    fn test_split_ratio_wire_format() {
        assert_eq!(
            serde_json::to_string(&SplitRatio::SeventyThirty).unwrap(),
            "\"70-30\""
        );
        assert_eq!(SplitRatio::default(), SplitRatio::EightyTwenty);
        assert_eq!("80-20".parse::<SplitRatio>().unwrap(), SplitRatio::EightyTwenty);
        assert!("60-40".parse::<SplitRatio>().is_err());
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!(
            "decision_tree".parse::<ModelKind>().unwrap(),
            ModelKind::DecisionTree
        );
        assert_eq!(
            serde_json::to_string(&ModelKind::LogisticRegression).unwrap(),
            "\"logistic_regression\""
        );
        let err = "random_forest".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_user_message_prefers_backend_detail() {
        let with_detail = PipelineError::Backend {
            action: PipelineAction::Split,
            status: 400,
            detail: Some("No dataset uploaded".to_string()),
        };
        assert_eq!(with_detail.user_message(), "No dataset uploaded");

        let without_detail = PipelineError::Backend {
            action: PipelineAction::Train,
            status: 500,
            detail: None,
        };
        assert_eq!(without_detail.user_message(), "Failed to train model");

        let transport = PipelineError::Transport {
            action: PipelineAction::Upload,
            reason: "connection refused".to_string(),
        };
        assert_eq!(transport.user_message(), "Failed to upload dataset");
        assert!(!PipelineError::Busy.records_in_state());
    }
}
