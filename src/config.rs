use anyhow::{Context, Result};

/// Configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_sample_size: usize,
    pub seed: u64,
    pub top_artist_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_sample_size: 100,
            seed: 42,
            top_artist_limit: 10,
        }
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable lookup, falling back to defaults
/// for unset variables and failing on unparseable ones
pub fn config_from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();
    Ok(Config {
        max_sample_size: read_var(&lookup, "VIBE_MAX_SAMPLE", defaults.max_sample_size)?,
        seed: read_var(&lookup, "VIBE_SEED", defaults.seed)?,
        top_artist_limit: read_var(&lookup, "VIBE_TOP_ARTISTS", defaults.top_artist_limit)?,
    })
}

fn read_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        _ => Ok(default),
    }
}
