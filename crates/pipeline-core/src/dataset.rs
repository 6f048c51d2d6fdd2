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

use pipeline_contracts::{PipelineError, PipelineResult};
use std::path::Path;

pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

const CSV_MIME: &str = "text/csv";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A dataset file held in memory, ready to be sent as a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl DatasetFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                PipelineError::Validation(format!("'{}' is not a file path", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("xlsx") => XLSX_MIME,
            _ => CSV_MIME,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let supported = self
            .extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(PipelineError::Validation(format!(
                "Unsupported file '{}': only CSV and Excel (.xlsx) files are supported",
                self.file_name
            )));
        }
        if self.bytes.is_empty() {
            return Err(PipelineError::Validation(
                "Uploaded file is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_csv_and_xlsx_in_any_case() {
        assert!(DatasetFile::from_bytes("iris.csv", "a,b\n1,2").validate().is_ok());
        assert!(DatasetFile::from_bytes("IRIS.CSV", "a,b\n1,2").validate().is_ok());
        let sheet = DatasetFile::from_bytes("sales.xlsx", vec![0x50, 0x4b]);
        assert!(sheet.validate().is_ok());
        assert_eq!(sheet.mime_type(), XLSX_MIME);
    }

    #[test]
    fn test_rejects_other_extensions_and_empty_files() {
        for name in ["data.json", "data.xls", "csv", "notes.csv.txt"] {
            let err = DatasetFile::from_bytes(name, "x").validate().unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)), "{name}");
        }
        let empty = DatasetFile::from_bytes("empty.csv", Vec::new());
        assert_eq!(
            empty.validate().unwrap_err().user_message(),
            "Uploaded file is empty"
        );
    }

    #[tokio::test]
    async fn test_from_path_reads_name_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris.csv");
        std::fs::write(&path, "sepal_length,species\n5.1,setosa\n").unwrap();

        let file = DatasetFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name(), "iris.csv");
        assert!(file.bytes().starts_with(b"sepal_length"));

        let missing = DatasetFile::from_path(dir.path().join("missing.csv")).await;
        assert!(matches!(missing, Err(PipelineError::Io(_))));
    }
}
