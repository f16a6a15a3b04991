// Config loader and validator
//
// Loads livediff.yaml, resolves variable interpolation, validates server
// and diff settings. The two file paths are carried through untouched and
// may be missing.

mod error;
mod interpolation;
mod loader;
mod raw;
mod source;
mod types;

pub use error::ConfigError;
pub use interpolation::resolve_variables;
pub use loader::load_config;
pub use source::{ConfigSource, DefaultSource, FileSource, StringSource, EMPTY_CONFIG};
pub use types::{
    Config, DiffConfig, DiffExecution, FilesConfig, ServerConfig, DEFAULT_LOG_LEVEL,
    DEFAULT_PORT,
};
