// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use super::error::ConfigError;
use super::interpolation::resolve_variables;
use super::raw;
use super::source::ConfigSource;
use super::types::*;

/// Load and validate a livediff config from the given source.
///
/// Steps:
/// 1. Read raw YAML text from the source
/// 2. Parse into raw deserialization types
/// 3. Check the contract version
/// 4. Resolve `${VAR}` interpolation in string fields
/// 5. Validate server and diff settings, filling defaults
///
/// File paths are optional here. A config without them still loads; the
/// `/` route reports the gap per request.
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.livediff != "v1" {
        return Err(ConfigError::Validation(format!(
            "unsupported config version \"{}\", expected \"v1\"",
            raw.livediff
        )));
    }

    let files = build_files_config(raw.files.unwrap_or_default())?;
    let server = build_server_config(raw.server.unwrap_or_default())?;
    let diff = build_diff_config(raw.diff.unwrap_or_default())?;
    let log_level = match raw.log_level {
        Some(level) => resolve_variables(&level)?,
        None => DEFAULT_LOG_LEVEL.to_string(),
    };

    Ok(Config {
        version: raw.livediff,
        files,
        server,
        diff,
        log_level,
    })
}

fn build_files_config(raw: raw::RawFiles) -> Result<FilesConfig, ConfigError> {
    let resolve = |path: Option<String>| -> Result<Option<String>, ConfigError> {
        path.map(|p| resolve_variables(&p)).transpose()
    };
    Ok(FilesConfig {
        file1: resolve(raw.file1)?,
        file2: resolve(raw.file2)?,
    })
}

fn build_server_config(raw: raw::RawServer) -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();

    let host = match raw.host {
        Some(host) => {
            let host = resolve_variables(&host)?;
            host.parse::<IpAddr>()
                .map_err(|source| ConfigError::InvalidHost { host, source })?
        }
        None => defaults.host,
    };

    let port = raw.port.unwrap_or(defaults.port);
    if port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be between 1 and 65535".to_string(),
        ));
    }

    Ok(ServerConfig {
        host,
        port,
        cors: raw.cors.unwrap_or(defaults.cors),
    })
}

fn build_diff_config(raw: raw::RawDiff) -> Result<DiffConfig, ConfigError> {
    let execution = match raw.execution.as_deref() {
        None | Some("blocking") => DiffExecution::Blocking,
        Some("inline") => DiffExecution::Inline,
        Some(other) => {
            return Err(ConfigError::Validation(format!(
                "diff.execution \"{other}\" is not one of: inline, blocking"
            )))
        }
    };
    Ok(DiffConfig { execution })
}
