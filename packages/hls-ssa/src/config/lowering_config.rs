//! Lowering configuration
//!
//! A preset gives complete defaults; a YAML v1 file picks a preset and may
//! override single fields:
//!
//! ```yaml
//! version: 1
//! preset: fast
//! lowering:
//!   max_literal_width: 64
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use crate::features::lowering::LoweringOptions;
use crate::shared::models::MAX_LITERAL_WIDTH;

/// Schema versions this crate reads
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Knobs of one lowering run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Run the finalize post-condition check after lowering
    pub verify_on_finalize: bool,

    /// Attach variable-derived names (`x_3`) to values
    pub name_values: bool,

    /// Widest literal accepted (1..=128)
    pub max_literal_width: u32,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl LoweringConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self {
                verify_on_finalize: true,
                name_values: true,
                max_literal_width: MAX_LITERAL_WIDTH,
            },
            Preset::Fast => Self {
                verify_on_finalize: false,
                name_values: false,
                max_literal_width: MAX_LITERAL_WIDTH,
            },
        }
    }

    pub fn verify_on_finalize(mut self, enabled: bool) -> Self {
        self.verify_on_finalize = enabled;
        self
    }

    pub fn name_values(mut self, enabled: bool) -> Self {
        self.name_values = enabled;
        self
    }

    pub fn max_literal_width(mut self, width: u32) -> Self {
        self.max_literal_width = width;
        self
    }

    /// Parse and validate a YAML v1 document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: LoweringConfigFileV1 = serde_yaml::from_str(content)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = match file.preset.as_deref() {
            Some(name) => {
                Preset::from_str(name).map_err(|_| ConfigError::UnknownPreset(name.to_string()))?
            }
            None => Preset::default(),
        };

        let mut config = Self::from_preset(preset);
        if let Some(overrides) = file.lowering {
            overrides.apply(&mut config);
        }
        config.validate()?;

        tracing::debug!(
            %preset,
            verify_on_finalize = config.verify_on_finalize,
            name_values = config.name_values,
            max_literal_width = config.max_literal_width,
            "lowering config loaded"
        );
        Ok(config)
    }

    /// Read, parse and validate a YAML v1 file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize as a YAML v1 document with every field overridden
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = LoweringConfigFileV1 {
            version: Some(1),
            preset: None,
            lowering: Some(LoweringOverrides {
                verify_on_finalize: Some(self.verify_on_finalize),
                name_values: Some(self.name_values),
                max_literal_width: Some(self.max_literal_width),
            }),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

impl Validatable for LoweringConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_literal_width == 0 || self.max_literal_width > MAX_LITERAL_WIDTH {
            return Err(ConfigError::range_with_hint(
                "max_literal_width",
                self.max_literal_width,
                1,
                MAX_LITERAL_WIDTH,
                "Literals are stored in 128 bits",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "LoweringConfig"
    }
}

impl From<&LoweringConfig> for LoweringOptions {
    fn from(config: &LoweringConfig) -> Self {
        LoweringOptions {
            verify_on_finalize: config.verify_on_finalize,
            name_values: config.name_values,
            max_literal_width: config.max_literal_width,
        }
    }
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoweringConfigFileV1 {
    /// Schema version (always 1 for v1)
    version: Option<u32>,

    /// Base preset
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<String>,

    /// Field-level overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    lowering: Option<LoweringOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoweringOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    verify_on_finalize: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    name_values: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_literal_width: Option<u32>,
}

impl LoweringOverrides {
    fn apply(&self, config: &mut LoweringConfig) {
        if let Some(v) = self.verify_on_finalize {
            config.verify_on_finalize = v;
        }
        if let Some(v) = self.name_values {
            config.name_values = v;
        }
        if let Some(v) = self.max_literal_width {
            config.max_literal_width = v;
        }
    }
}
