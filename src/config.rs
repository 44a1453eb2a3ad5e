use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;
pub const DEFAULT_K_FACTOR: f64 = 10.0;

/// Rating parameters shared by every pass over the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    /// Seed rating for entities never seen before
    pub initial_rating: f64,
    /// Update sensitivity; larger values react faster to recent results
    pub k_factor: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_INITIAL_RATING,
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

impl EloConfig {
    /// Read `ELO_INITIAL_RATING` and `ELO_K_FACTOR`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            initial_rating: env_f64("ELO_INITIAL_RATING")?.unwrap_or(defaults.initial_rating),
            k_factor: env_f64("ELO_K_FACTOR")?.unwrap_or(defaults.k_factor),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, initial_rating: Option<f64>, k_factor: Option<f64>) -> Result<Self> {
        if let Some(rating) = initial_rating {
            self.initial_rating = rating;
        }
        if let Some(k) = k_factor {
            self.k_factor = k;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.initial_rating.is_finite() {
            return Err(FeatureError::Config(format!(
                "initial_rating must be finite, got {}",
                self.initial_rating
            )));
        }
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(FeatureError::Config(format!(
                "k_factor must be a positive number, got {}",
                self.k_factor
            )));
        }
        Ok(())
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| FeatureError::Config(format!("{} = '{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
