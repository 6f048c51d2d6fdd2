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

use pipeline_contracts::{BackendConfig, PipelineError, PipelineResult};
use std::path::Path;

pub const API_URL_ENV: &str = "PIPELINE_API_URL";
pub const TIMEOUT_ENV: &str = "PIPELINE_TIMEOUT_SECONDS";

/// Defaults, then the optional TOML file, then the process environment.
pub fn load_backend_config(path: Option<&Path>) -> PipelineResult<BackendConfig> {
    let config = layered_config(path, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Layers file and `lookup` values over the defaults without validating, so
/// callers with higher-precedence overrides can apply them first.
pub fn layered_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> PipelineResult<BackendConfig> {
    let mut config = match path {
        Some(path) => from_toml_file(path)?,
        None => BackendConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    Ok(config)
}

pub fn from_toml_file(path: &Path) -> PipelineResult<BackendConfig> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| {
        PipelineError::Configuration(format!("Failed to parse {}: {e}", path.display()))
    })
}

pub fn apply_env_overrides(
    config: &mut BackendConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PipelineResult<()> {
    if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
        config.base_url = url.trim().to_string();
    }
    if let Some(raw) = lookup(TIMEOUT_ENV) {
        config.timeout_seconds = raw.trim().parse().map_err(|_| {
            PipelineError::Configuration(format!("{TIMEOUT_ENV} must be a whole number, got '{raw}'"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://ml-backend:8080\"").unwrap();
        writeln!(file, "user_agent = \"wizard-test\"").unwrap();

        let config = from_toml_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://ml-backend:8080");
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.user_agent.as_deref(), Some("wizard-test"));
    }

    #[test]
    fn test_invalid_toml_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = ").unwrap();
        assert!(matches!(
            from_toml_file(file.path()),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = BackendConfig::with_base_url("http://from-file:8000");
        let lookup = lookup_from(&[
            (API_URL_ENV, "http://from-env:9000"),
            (TIMEOUT_ENV, "15"),
        ]);
        apply_env_overrides(&mut config, lookup).unwrap();
        assert_eq!(config.base_url, "http://from-env:9000");
        assert_eq!(config.timeout_seconds, 15);
    }

    #[test]
    fn test_blank_url_keeps_existing_value() {
        let mut config = BackendConfig::default();
        apply_env_overrides(&mut config, lookup_from(&[(API_URL_ENV, "  ")])).unwrap();
        assert_eq!(config, BackendConfig::default());
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let mut config = BackendConfig::default();
        let result = apply_env_overrides(&mut config, lookup_from(&[(TIMEOUT_ENV, "soon")]));
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_layered_config_defers_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://ml-backend:8080\"").unwrap();

        let config =
            layered_config(Some(file.path()), lookup_from(&[(TIMEOUT_ENV, "0")])).unwrap();
        assert_eq!(config.base_url, "http://ml-backend:8080");
        assert_eq!(config.timeout_seconds, 0);
        assert!(config.validate().is_err());
    }
}
