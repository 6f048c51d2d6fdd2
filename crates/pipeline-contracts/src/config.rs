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

use crate::types::{PipelineAction, PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_seconds() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
        }
    }
}

impl BackendConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            PipelineError::Configuration(format!("Invalid backend URL '{}': {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::Configuration(format!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(PipelineError::Configuration(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self, action: PipelineAction) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), action.endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_partial_config() {
        let config: BackendConfig = serde_json::from_str(r#"{"timeout_seconds": 5}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = BackendConfig::with_base_url("http://ml.local:9000/api/");
        assert_eq!(
            config.endpoint(PipelineAction::Train),
            "http://ml.local:9000/api/train"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(BackendConfig::with_base_url("not a url").validate().is_err());
        assert!(BackendConfig::with_base_url("ftp://host").validate().is_err());

        let zero_timeout = BackendConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_timeout.validate(),
            Err(PipelineError::Configuration(_))
        ));
    }
}
