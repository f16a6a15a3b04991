// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use super::error::ConfigError;

/// Minimal document used when no config file is given on the command line.
pub const EMPTY_CONFIG: &str = "livediff: v1\n";

/// Where the YAML config text comes from.
pub trait ConfigSource {
    fn load(&self) -> Result<String, ConfigError>;

    /// Human-readable origin, used in startup logs.
    fn describe(&self) -> String;
}

/// Reads `livediff.yaml` (or whatever `--config` names) from disk.
pub struct FileSource {
    pub path: PathBuf,
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Inline YAML. Tests use this to avoid touching the filesystem.
pub struct StringSource {
    pub content: String,
}

impl ConfigSource for StringSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(self.content.clone())
    }

    fn describe(&self) -> String {
        "<inline>".to_string()
    }
}

/// No config file at all: every setting takes its default and the file
/// paths come from the command line (or stay unset).
pub struct DefaultSource;

impl ConfigSource for DefaultSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(EMPTY_CONFIG.to_string())
    }

    fn describe(&self) -> String {
        "<defaults>".to_string()
    }
}
