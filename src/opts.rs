//! Training options.

use clap::Args;
use serde::Deserialize;

use crate::prelude::*;

/// Matrix factorization hyperparameters as they come from the command line or a config file.
#[derive(Args, Deserialize, Debug, Clone, Copy)]
#[serde(default, rename_all = "kebab-case")]
pub struct TrainerOpts {
    /// Number of latent features
    #[arg(long, default_value_t = 25, env = "SVD_RECOMMENDER_N_FEATURES")]
    pub n_features: usize,

    /// Popularity weight in percents: 0 disables the popularity blending,
    /// 100 ranks purely by popularity
    #[arg(long, default_value_t = 0, env = "SVD_RECOMMENDER_POPULARITY_WEIGHT")]
    pub popularity_weight: u32,

    /// Maximum number of passes over the observed ratings
    #[arg(long, default_value_t = 45, env = "SVD_RECOMMENDER_EPOCHS")]
    pub epochs: usize,

    /// Gradient descent step size
    #[arg(long, default_value_t = 0.002, env = "SVD_RECOMMENDER_LEARNING_RATE")]
    pub learning_rate: f64,

    /// L2 regularization of the latent features
    #[arg(long, default_value_t = 0.02, env = "SVD_RECOMMENDER_REGULARIZATION")]
    pub regularization: f64,

    /// Weight of the squared error term in the gradient step
    #[arg(long, default_value_t = 1.0, env = "SVD_RECOMMENDER_GRADIENT_WEIGHT")]
    pub gradient_weight: f64,

    /// Stop as soon as the epoch's total squared error drops to this value
    #[arg(long, default_value_t = 0.5, env = "SVD_RECOMMENDER_CONVERGENCE_THRESHOLD")]
    pub convergence_threshold: f64,

    /// Seed for the latent feature initialization, random if omitted
    #[arg(long, env = "SVD_RECOMMENDER_SEED")]
    pub seed: Option<u64>,
}

impl Default for TrainerOpts {
    fn default() -> Self {
        Self {
            n_features: 25,
            popularity_weight: 0,
            epochs: 45,
            learning_rate: 0.002,
            regularization: 0.02,
            gradient_weight: 1.0,
            convergence_threshold: 0.5,
            seed: None,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum OptsError {
    #[error("feature count must be positive")]
    ZeroFeatures,

    #[error("popularity weight must be within 0–100%, got {0}%")]
    PopularityWeight(u32),

    #[error("number of epochs must be positive")]
    ZeroEpochs,

    #[error("learning rate must be a positive number, got {0}")]
    LearningRate(f64),

    #[error("regularization must be a non-negative number, got {0}")]
    Regularization(f64),

    #[error("gradient weight must be within [0, 1], got {0}")]
    GradientWeight(f64),

    #[error("convergence threshold must be a non-negative number, got {0}")]
    ConvergenceThreshold(f64),
}

/// Validated hyperparameters.
///
/// Only [`TrainerOpts::validate`] constructs them, so a trainer never sees an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    n_features: usize,

    /// Popularity weight as a fraction from `[0, 1]`.
    popularity_weight: f64,

    epochs: usize,
    learning_rate: f64,
    regularization: f64,
    gradient_weight: f64,
    convergence_threshold: f64,
    seed: Option<u64>,
}

impl Hyperparameters {
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Popularity weight as a fraction from `[0, 1]`.
    pub const fn popularity_weight(&self) -> f64 {
        self.popularity_weight
    }

    pub const fn epochs(&self) -> usize {
        self.epochs
    }

    pub const fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub const fn regularization(&self) -> f64 {
        self.regularization
    }

    pub const fn gradient_weight(&self) -> f64 {
        self.gradient_weight
    }

    pub const fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl TrainerOpts {
    pub fn validate(&self) -> StdResult<Hyperparameters, OptsError> {
        if self.n_features == 0 {
            return Err(OptsError::ZeroFeatures);
        }
        if self.popularity_weight > 100 {
            return Err(OptsError::PopularityWeight(self.popularity_weight));
        }
        if self.epochs == 0 {
            return Err(OptsError::ZeroEpochs);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(OptsError::LearningRate(self.learning_rate));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(OptsError::Regularization(self.regularization));
        }
        if !(0.0..=1.0).contains(&self.gradient_weight) {
            return Err(OptsError::GradientWeight(self.gradient_weight));
        }
        if !(self.convergence_threshold.is_finite() && self.convergence_threshold >= 0.0) {
            return Err(OptsError::ConvergenceThreshold(self.convergence_threshold));
        }
        Ok(Hyperparameters {
            n_features: self.n_features,
            popularity_weight: f64::from(self.popularity_weight) / 100.0,
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            regularization: self.regularization,
            gradient_weight: self.gradient_weight,
            convergence_threshold: self.convergence_threshold,
            seed: self.seed,
        })
    }
}
