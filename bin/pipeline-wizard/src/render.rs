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

use pipeline_core::{completed_steps, DatasetSummary, PipelineState, TrainingResult, WizardStep};
use std::fmt::Write;

pub fn step_indicator(state: &PipelineState) -> String {
    let completed = completed_steps(state);
    WizardStep::ALL
        .iter()
        .map(|step| {
            let marker = if *step == state.current_step() {
                '>'
            } else if completed.contains(step) {
                'x'
            } else {
                ' '
            };
            format!("[{marker}] {step}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn dataset_summary(dataset: &DatasetSummary) -> String {
    let mut out = format!(
        "{}: {} rows, {} columns\n",
        dataset.filename, dataset.rows, dataset.columns
    );
    for name in &dataset.column_names {
        let kind = if dataset.is_numeric(name) {
            "numeric"
        } else {
            "categorical"
        };
        let _ = writeln!(out, "  - {name} ({kind})");
    }
    out
}

pub fn results_table(result: &TrainingResult) -> String {
    let model = result
        .model_kind()
        .map_or(result.model_name.as_str(), |kind| kind.display_name());
    let mut out = format!(
        "Model: {model}\nAccuracy: {:.1}% ({})\nTrain samples: {}  Test samples: {}\n\nConfusion matrix (rows = actual, columns = predicted)\n",
        result.accuracy_percent(),
        result.grade().label(),
        result.train_size,
        result.test_size,
    );

    let width = result
        .class_labels
        .iter()
        .map(String::len)
        .chain(
            result
                .confusion_matrix
                .iter()
                .flatten()
                .map(|count| count.to_string().len()),
        )
        .max()
        .unwrap_or(1);

    let _ = write!(out, "{:width$}", "");
    for label in &result.class_labels {
        let _ = write!(out, " {label:>width$}");
    }
    out.push('\n');
    for (label, row) in result.class_labels.iter().zip(&result.confusion_matrix) {
        let _ = write!(out, "{label:width$}");
        for count in row {
            let _ = write!(out, " {count:>width$}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> TrainingResult {
        TrainingResult {
            accuracy: 0.93,
            confusion_matrix: vec![vec![15, 0], vec![3, 27]],
            class_labels: vec!["no".into(), "yes".into()],
            model_name: "decision_tree".into(),
            train_size: 105,
            test_size: 45,
        }
    }

    #[test]
    fn test_indicator_marks_current_step() {
        let indicator = step_indicator(&PipelineState::default());
        assert!(indicator.starts_with("[>] 1. Upload"));
        assert!(indicator.contains("[ ] 5. Results"));
    }

    #[test]
    fn test_results_table_layout() {
        let table = results_table(&result());
        assert!(table.contains("Model: Decision Tree"));
        assert!(table.contains("Accuracy: 93.0% (Excellent)"));
        assert!(table.contains("Train samples: 105  Test samples: 45"));
        let rows: Vec<&str> = table.lines().rev().take(2).collect();
        assert_eq!(rows[0], "yes   3  27");
        assert_eq!(rows[1], "no   15   0");
    }
}
