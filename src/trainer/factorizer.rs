//! Stochastic gradient descent matrix factorization.
//!
//! See: <https://sifter.org/~simon/journal/20061211.html>.

use rand::Rng;

use crate::index::KeyIndex;
use crate::math::matrix::Matrix;
use crate::math::vector::{dot, is_finite};
use crate::opts::Hyperparameters;
use crate::prelude::*;
use crate::trainer::cancellation::Cancellation;
use crate::trainer::error::SquaredError;
use crate::trainer::matrix::RatingMatrix;
use crate::trainer::popularity::ItemPopularity;
use crate::trainer::TrainError;

/// Upper bound of the initial latent feature values.
const INITIAL_FACTOR_SCALE: f64 = 0.1;

/// Popularity the objective pulls the items towards.
const TARGET_POPULARITY: f64 = 2.5;

#[derive(Debug, Copy, Clone)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,

    /// Sum of the squared prediction errors, measured before each cell's update.
    pub total_squared_error: f64,

    pub rmse: f64,

    /// Popularity-aware objective, measured after each cell's update.
    pub objective: f64,
}

pub struct Factorization {
    pub user_factors: Matrix,
    pub item_factors: Matrix,
    pub reports: Vec<EpochReport>,

    /// Whether the training stopped on the convergence threshold.
    pub is_converged: bool,
}

pub struct MatrixFactorizer {
    hyperparameters: Hyperparameters,
    cancellation: Cancellation,
}

impl MatrixFactorizer {
    #[must_use]
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            hyperparameters,
            cancellation: Cancellation::default(),
        }
    }

    #[must_use]
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Factorizes the observed cells of the matrix into users × k and items × k feature matrices.
    ///
    /// The indices map the matrix rows and columns back to the entity IDs
    /// for the objective and the diagnostics.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            n_users = matrix.n_users(),
            n_items = matrix.n_items(),
            n_observed = matrix.n_observed(),
            n_features = self.hyperparameters.n_features(),
        ),
    )]
    pub fn factorize<R: Rng + ?Sized>(
        &self,
        matrix: &RatingMatrix,
        user_index: &KeyIndex,
        item_index: &KeyIndex,
        popularity: &ItemPopularity,
        rng: &mut R,
    ) -> StdResult<Factorization, TrainError> {
        let hyperparameters = &self.hyperparameters;
        let n_features = hyperparameters.n_features();
        let epochs = hyperparameters.epochs();
        let learning_rate = hyperparameters.learning_rate();
        let regularization = hyperparameters.regularization();
        let gradient_weight = hyperparameters.gradient_weight();
        let convergence_threshold = hyperparameters.convergence_threshold();

        if matrix.n_observed() == 0 {
            return Err(TrainError::EmptyDataset);
        }
        let mut user_factors =
            Matrix::random(matrix.n_users(), n_features, INITIAL_FACTOR_SCALE, rng);
        let mut item_factors =
            Matrix::random(matrix.n_items(), n_features, INITIAL_FACTOR_SCALE, rng);

        let mut reports = Vec::with_capacity(epochs);
        let mut is_converged = false;
        for epoch in 1..=epochs {
            if self.cancellation.is_cancelled() {
                return Err(TrainError::Cancelled { epoch });
            }

            let mut error = SquaredError::default();
            let mut objective = 0.0;
            for (user_row, item_row, value) in matrix.observed_cells() {
                let user_vector = user_factors.row_mut(user_row);
                let item_vector = item_factors.row_mut(item_row);

                let residual_error = value - dot(user_vector, item_vector);
                error.push(residual_error);
                adjust_factors(
                    user_vector,
                    item_vector,
                    residual_error,
                    learning_rate,
                    regularization,
                    gradient_weight,
                );

                if !(is_finite(user_vector) && is_finite(item_vector)) {
                    return Err(TrainError::Diverged {
                        epoch,
                        user_row,
                        item_row,
                        user_id: user_index.key_at(user_row),
                        item_id: item_index.key_at(item_row),
                    });
                }

                let item_popularity = item_index
                    .key_at(item_row)
                    .map_or(0.0, |item_id| popularity.get(item_id));
                objective += gradient_weight
                    * (value - dot(user_vector, item_vector)).powi(2)
                    + (1.0 - gradient_weight) * (item_popularity - TARGET_POPULARITY).powi(2);
            }

            let report = EpochReport {
                epoch,
                total_squared_error: error.total(),
                rmse: error.rmse(),
                objective,
            };
            info!(
                epoch,
                rmse = report.rmse,
                total_squared_error = report.total_squared_error,
                objective = report.objective,
            );
            reports.push(report);

            if report.total_squared_error <= convergence_threshold {
                debug!(epoch, convergence_threshold, "converged");
                is_converged = true;
                break;
            }
        }

        if !is_converged {
            info!(epochs, "stopped without reaching the convergence threshold");
        }
        Ok(Factorization {
            user_factors,
            item_factors,
            reports,
            is_converged,
        })
    }
}

/// Simultaneous regularized gradient step on a user and an item vector.
///
/// Both updates of a feature are computed from the values the feature had before the step.
#[inline]
fn adjust_factors(
    user_vector: &mut [f64],
    item_vector: &mut [f64],
    residual_error: f64,
    learning_rate: f64,
    regularization: f64,
    gradient_weight: f64,
) {
    debug_assert_eq!(user_vector.len(), item_vector.len());
    let scaled_error = 2.0 * gradient_weight * residual_error;
    for (user_factor, item_factor) in user_vector.iter_mut().zip(item_vector.iter_mut()) {
        let (old_user_factor, old_item_factor) = (*user_factor, *item_factor);
        *user_factor +=
            learning_rate * (scaled_error * old_item_factor - regularization * old_user_factor);
        *item_factor +=
            learning_rate * (scaled_error * old_user_factor - regularization * old_item_factor);
    }
}
