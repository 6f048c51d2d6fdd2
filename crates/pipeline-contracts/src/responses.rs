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

use crate::types::ModelKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rows kept from the backend's preview; the summary is for display only.
pub const MAX_PREVIEW_ROWS: usize = 5;

pub type PreviewRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDatasetSummary")]
pub struct DatasetSummary {
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub preview: Vec<PreviewRow>,
}

impl DatasetSummary {
    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|name| name == column)
    }
}

/// Some backends report `columns` as the list of names instead of a count.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnsField {
    Count(usize),
    Names(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDatasetSummary {
    filename: String,
    rows: usize,
    columns: ColumnsField,
    #[serde(default)]
    column_names: Option<Vec<String>>,
    #[serde(default)]
    numeric_columns: Vec<String>,
    #[serde(default)]
    preview: Vec<PreviewRow>,
}

impl TryFrom<RawDatasetSummary> for DatasetSummary {
    type Error = String;

    fn try_from(raw: RawDatasetSummary) -> Result<Self, Self::Error> {
        let names = raw.column_names.filter(|names| !names.is_empty());
        let (columns, column_names) = match (raw.columns, names) {
            (ColumnsField::Count(count), Some(names)) => {
                if count != names.len() {
                    return Err(format!(
                        "column count {count} does not match {} column names",
                        names.len()
                    ));
                }
                (count, names)
            }
            (ColumnsField::Count(count), None) => (count, Vec::new()),
            (ColumnsField::Names(names), _) => (names.len(), names),
        };

        if !column_names.is_empty() {
            if let Some(unknown) = raw
                .numeric_columns
                .iter()
                .find(|name| !column_names.contains(name))
            {
                return Err(format!("numeric column '{unknown}' is not a dataset column"));
            }
        }

        let mut preview = raw.preview;
        preview.truncate(MAX_PREVIEW_ROWS);

        Ok(Self {
            filename: raw.filename,
            rows: raw.rows,
            columns,
            column_names,
            numeric_columns: raw.numeric_columns,
            preview,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResult {
    pub accuracy: f64,
    pub confusion_matrix: Vec<Vec<u64>>,
    pub class_labels: Vec<String>,
    #[serde(alias = "model")]
    pub model_name: String,
    pub train_size: usize,
    pub test_size: usize,
}

impl TrainingResult {
    /// Checks the accuracy range and that the matrix is labels x labels.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(format!("accuracy {} outside [0, 1]", self.accuracy));
        }
        let size = self.class_labels.len();
        if self.confusion_matrix.len() != size
            || self.confusion_matrix.iter().any(|row| row.len() != size)
        {
            return Err(format!(
                "confusion matrix is not {size}x{size} for {size} class labels"
            ));
        }
        Ok(())
    }

    pub fn model_kind(&self) -> Option<ModelKind> {
        self.model_name.parse().ok()
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy * 100.0
    }

    pub fn grade(&self) -> AccuracyGrade {
        AccuracyGrade::from_accuracy(self.accuracy)
    }

    pub fn correct_predictions(&self) -> u64 {
        self.confusion_matrix
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.get(i))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl AccuracyGrade {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 0.9 {
            AccuracyGrade::Excellent
        } else if accuracy >= 0.7 {
            AccuracyGrade::Good
        } else if accuracy >= 0.5 {
            AccuracyGrade::Fair
        } else {
            AccuracyGrade::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccuracyGrade::Excellent => "Excellent",
            AccuracyGrade::Good => "Good",
            AccuracyGrade::Fair => "Fair",
            AccuracyGrade::Poor => "Poor",
        }
    }
}

/// Body of `/preprocess` and `/split` replies. Every field is optional since
/// the reply may be an empty acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub train_size: Option<usize>,
    #[serde(default)]
    pub test_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Failure body. `detail` is usually a string, but validation failures can
/// carry structured detail, which is not shown verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn detail_message(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(message)) if !message.trim().is_empty() => Some(message.clone()),
            _ => None,
        }
    }
}
