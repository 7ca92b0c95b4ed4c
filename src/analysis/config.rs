use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Settings for a single analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub max_sample_size: usize, // Upper bound on the number of sampled tracks
    pub seed: u64,              // Seed for every random draw made by the sampler
    pub top_artist_limit: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_sample_size: 100,
            seed: 42,
            top_artist_limit: 10,
        }
    }
}

impl From<&Config> for AnalysisSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_sample_size: config.max_sample_size,
            seed: config.seed,
            top_artist_limit: config.top_artist_limit,
        }
    }
}

impl AnalysisSettings {
    pub fn from_json(content: &str) -> Result<AnalysisSettings, Box<dyn std::error::Error>> {
        let settings: AnalysisSettings = serde_json::from_str(content)?;
        Ok(settings)
    }

    /// Layer a settings file over an environment-derived base
    pub fn merged_over(base: &Config, overlay: &str) -> Result<AnalysisSettings, Box<dyn std::error::Error>> {
        let mut value = serde_json::to_value(AnalysisSettings::from(base))?;
        let overlay: serde_json::Value = serde_json::from_str(overlay)?;
        if let (Some(target), Some(source)) = (value.as_object_mut(), overlay.as_object()) {
            for (key, v) in source {
                target.insert(key.clone(), v.clone());
            }
        } else {
            return Err("settings file must contain a JSON object".into());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Read a settings file and layer it over `base`; keys the file omits
    /// keep the environment value
    pub fn load_over(base: &Config, path: &str) -> Result<AnalysisSettings, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::merged_over(base, &content)
    }
}
