pub mod adapters;
pub mod check;
pub mod normalize;
pub mod output;

pub use adapters::run_adapters;
pub use check::run_check;
pub use normalize::run_normalize;

use crate::config::NormalizerConfig;
use crate::error::ConfigError;
use std::path::Path;

/// The configuration at `path`, or the empty configuration when none is given
pub fn load_config(path: Option<&Path>) -> Result<NormalizerConfig, ConfigError> {
    match path {
        Some(path) => NormalizerConfig::load(path),
        None => Ok(NormalizerConfig::default()),
    }
}
