//! Run configuration shared by the CLI and GUI front-ends.

use crate::InvertOptions;
use std::path::PathBuf;

/// Where inverted copies go and how they are produced.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Directory the `_processed.pdf` files are written into
    pub output_dir: PathBuf,
    /// Options handed to every worker run
    pub options: InvertOptions,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            options: InvertOptions::default(),
        }
    }
}

impl ShellConfig {
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: InvertOptions::default(),
        }
    }
}

/// The user's home directory, or the working directory if there is none.
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
