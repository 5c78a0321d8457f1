use std::{path::PathBuf, time::Duration};

use crate::{matcher::MatcherOptions, penguin::DEFAULT_REFRESH_INTERVAL};

/// Library-side settings for a [`Sensei`](crate::Sensei).
#[derive(Debug, Clone, PartialEq)]
pub struct SenseiConfig {
    /// Where the material dictionary is written. When `None` the tokenizer is
    /// built straight from the in-memory vocabulary.
    pub dict_path: Option<PathBuf>,
    pub matcher: MatcherOptions,
    pub refresh_interval: Duration,
}

impl Default for SenseiConfig {
    fn default() -> Self {
        Self {
            dict_path: default_dict_path(),
            matcher: MatcherOptions::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// `<cache dir>/material-sensei/materials.txt`, when the platform has a cache
/// directory.
pub fn default_dict_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("material-sensei").join("materials.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_hourly_refresh() {
        let config = SenseiConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.matcher, MatcherOptions::default());
    }

    #[test]
    fn default_dict_lives_under_crate_dir() {
        if let Some(path) = default_dict_path() {
            assert!(path.ends_with("material-sensei/materials.txt"));
        }
    }
}
