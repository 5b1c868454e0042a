use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};
use crate::radius::Radius;

///
/// Thresholds for the structural quality filter.
///
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct StructureParams {
    /// filter guide if # of Gs or Cs is strictly less than this
    pub gc_min: usize,
    /// filter guide if # of Gs or Cs is strictly greater than this
    pub gc_max: usize,
    pub homopolymer_max: usize,
    pub dinucleotide_repeat_max: usize,
    pub hairpin_min_inner: usize,
    pub hairpin_min_outer: usize,
}

impl Default for StructureParams {
    fn default() -> Self {
        StructureParams {
            gc_min: 5,
            gc_max: 15,
            homopolymer_max: 5,
            dinucleotide_repeat_max: 3,
            hairpin_min_inner: 3,
            hairpin_min_outer: 5,
        }
    }
}

impl StructureParams {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.gc_min > self.gc_max {
            return Err(ConfigError::InvalidStructureParams(format!(
                "gc_min ({}) is greater than gc_max ({})",
                self.gc_min, self.gc_max
            )));
        }
        if self.hairpin_min_outer == 0 {
            return Err(ConfigError::InvalidStructureParams(
                "hairpin_min_outer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

///
/// Where the off-target server lives and how hard to try reaching it.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OfftargetConfig {
    pub host: String,
    pub port: u16,
    pub radii: Vec<Radius>,
    /// retries after the first failed attempt
    pub max_attempts: u32,
    /// retry `n` waits `2^(n + backoff_offset)` seconds
    pub backoff_offset: u32,
    pub timeout_secs: u64,
    /// guides per request, 0 sends everything at once
    pub batch_size: usize,
    pub startup_attempts: u32,
    pub startup_timeout_secs: u64,
}

impl Default for OfftargetConfig {
    fn default() -> Self {
        OfftargetConfig {
            host: "localhost".to_string(),
            port: 8080,
            radii: vec![Radius::FAR],
            max_attempts: 5,
            backoff_offset: 5,
            timeout_secs: 600,
            batch_size: 5000,
            startup_attempts: 20,
            startup_timeout_secs: 10,
        }
    }
}

impl OfftargetConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Seconds to wait before retry number `failures` (1-based).
    pub fn backoff_secs(&self, failures: u32) -> u64 {
        2u64.saturating_pow(failures + self.backoff_offset)
    }

    /// Settings used to probe a freshly launched server.
    pub fn startup(&self) -> OfftargetConfig {
        OfftargetConfig {
            max_attempts: self.startup_attempts,
            timeout_secs: self.startup_timeout_secs,
            ..self.clone()
        }
    }
}

///
/// Spacing requirements for the guide optimizer.
///
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DesignConfig {
    /// selected guides must cut at least this far apart
    pub min_spacing: usize,
    /// every site needs a selected guide cutting within this distance
    pub max_spacing: usize,
}

impl Default for DesignConfig {
    fn default() -> Self {
        DesignConfig {
            min_spacing: 50,
            max_spacing: 200,
        }
    }
}

impl DesignConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_spacing == 0 {
            return Err(ConfigError::InvalidDesignParams(
                "max_spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

///
/// Everything configurable about a dashit run, loadable from TOML:
///
/// ```toml
/// [structure]
/// gc_min = 4
///
/// [offtarget]
/// radii = ["5_9_18", "5_9_19"]
///
/// [design]
/// max_spacing = 250
/// ```
///
/// Missing tables and keys fall back to their defaults.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DashitConfig {
    pub structure: StructureParams,
    pub offtarget: OfftargetConfig,
    pub design: DesignConfig,
}

impl DashitConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.structure.validate()?;
        self.design.validate()?;
        Ok(())
    }
}

impl TryFrom<&Path> for DashitConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: DashitConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
