//! Collection configuration.

use crate::index::{IndexOptions, MAX_LEVEL};

/// Configuration for a collection and the indexes it builds.
#[derive(Debug, Clone)]
pub struct Config {
    /// Highest skip level an index node may reach (1..=32).
    pub max_level: usize,

    /// Seed for level generation. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Options used for fields that have no index of their own.
    pub default_index_options: IndexOptions,

    /// Emit a warning once a full scan has visited this many documents.
    pub scan_warning_threshold: usize,

    /// In strict mode, error instead of scanning the whole collection.
    pub forbid_full_scans: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            seed: None,
            default_index_options: IndexOptions::default(),
            scan_warning_threshold: 1000,
            forbid_full_scans: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the highest skip level. Clamped to `1..=32`.
    #[must_use]
    pub fn max_level(mut self, level: usize) -> Self {
        self.max_level = level.clamp(1, MAX_LEVEL);
        self
    }

    /// Seeds level generation for reproducible index layouts.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the options used for unindexed fields.
    #[must_use]
    pub fn default_index_options(mut self, options: IndexOptions) -> Self {
        self.default_index_options = options;
        self
    }

    /// Sets the full scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, threshold: usize) -> Self {
        self.scan_warning_threshold = threshold;
        self
    }

    /// Sets whether full collection scans are rejected.
    #[must_use]
    pub const fn forbid_full_scans(mut self, value: bool) -> Self {
        self.forbid_full_scans = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_level, 32);
        assert!(config.seed.is_none());
        assert!(!config.forbid_full_scans);
        assert_eq!(config.scan_warning_threshold, 1000);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_level(4)
            .seed(7)
            .forbid_full_scans(true)
            .scan_warning_threshold(10);

        assert_eq!(config.max_level, 4);
        assert_eq!(config.seed, Some(7));
        assert!(config.forbid_full_scans);
        assert_eq!(config.scan_warning_threshold, 10);
    }

    #[test]
    fn max_level_is_clamped() {
        assert_eq!(Config::new().max_level(0).max_level, 1);
        assert_eq!(Config::new().max_level(100).max_level, 32);
    }
}
