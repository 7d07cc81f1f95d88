//! Configuration
//!
//! Two tiers:
//! - Preset: `LoweringConfig::from_preset(Preset::Fast)`
//! - YAML v1: `LoweringConfig::from_file("lowering.yaml")?`, a preset plus
//!   field overrides
//!
//! Every loaded configuration is range-checked through `Validatable`.

pub mod error;
pub mod lowering_config;
pub mod preset;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use lowering_config::{LoweringConfig, SUPPORTED_VERSIONS};
pub use preset::Preset;
pub use validation::Validatable;
