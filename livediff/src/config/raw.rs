// Raw YAML deserialization types (internal).
// Kept apart from the public Config so interpolation and validation happen
// between parsing and the typed result.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub livediff: String,
    pub files: Option<RawFiles>,
    pub server: Option<RawServer>,
    pub diff: Option<RawDiff>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFiles {
    pub file1: Option<String>,
    pub file2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDiff {
    pub execution: Option<String>,
}
