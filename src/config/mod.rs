//! Exporter configuration.
//!
//! Every setting can come from a command-line flag, an environment
//! variable, a TOML file or a built-in default, in that order of
//! precedence. Flags and variables are declared by each binary with clap;
//! this module holds the file format, the defaults and the validation.

mod file;
mod sampler;

pub use file::{DatabaseSection, FileConfig, FilesSection, QuerySection, SamplerSection};
pub use sampler::{
    CommonArgs, FileCountConfig, QueryConfig, SamplerConfig, VariantDefaults, COUNT_FILES,
    DB_ACTIVITY, DB_QUERY,
};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The polling interval was zero.
    #[error("polling interval must be at least one second")]
    InvalidInterval,
    /// The cycle timeout was zero.
    #[error("cycle timeout must be at least one second")]
    InvalidTimeout,
    /// A setting with no default was not given anywhere.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
