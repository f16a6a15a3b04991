// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

/// All errors that can occur while loading and validating `livediff.yaml`.
///
/// Missing file paths are deliberately absent from this list: they are a
/// per-request condition, not a startup fault.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config source: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid listen host \"{host}\": {source}")]
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },

    #[error("undefined variable ${{{name}}} in config (not set in environment)")]
    UndefinedVariable { name: String },
}
