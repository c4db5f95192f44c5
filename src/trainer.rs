//! Trains the user and item latent features on the ratings.
//! Implements a stochastic gradient descent for matrix factorization
//! over the popularity-blended rating residuals.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bias::BiasModel;
use crate::index::KeyIndex;
use crate::model::Model;
use crate::opts::Hyperparameters;
use crate::prelude::*;
use crate::rating::Rating;

pub use self::cancellation::Cancellation;
pub use self::factorizer::{EpochReport, Factorization, MatrixFactorizer};
pub use self::matrix::{blend_residual, build_rating_matrix, RatingMatrix};
pub use self::popularity::{calculate_item_popularity, ItemPopularity};

pub mod cancellation;
pub mod error;
pub mod factorizer;
pub mod matrix;
pub mod popularity;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TrainError {
    #[error("there are no positive ratings to train on")]
    EmptyDataset,

    #[error(
        "training diverged at epoch #{epoch}: non-finite features of user {user_id:?} (row {user_row}) or item {item_id:?} (row {item_row})"
    )]
    Diverged {
        epoch: usize,
        user_row: usize,
        item_row: usize,
        user_id: Option<UserId>,
        item_id: Option<ItemId>,
    },

    #[error("training was cancelled before epoch #{epoch}")]
    Cancelled { epoch: usize },
}

/// Everything the factorization needs, derived from a single pass over the ratings.
pub struct TrainingData {
    pub user_index: KeyIndex,
    pub item_index: KeyIndex,
    pub popularity: ItemPopularity,
    pub matrix: RatingMatrix,
}

impl TrainingData {
    #[instrument(level = "info", skip_all, fields(n_ratings = ratings.len()))]
    pub fn prepare<B: BiasModel>(
        ratings: &[Rating],
        baseline: &B,
        popularity_weight: f64,
    ) -> Self {
        let user_index = KeyIndex::from_keys(ratings.iter().map(|rating| rating.user_id));
        let item_index = KeyIndex::from_keys(ratings.iter().map(|rating| rating.item_id));
        let popularity = calculate_item_popularity(ratings);
        let matrix = build_rating_matrix(
            ratings,
            &user_index,
            &item_index,
            baseline,
            &popularity,
            popularity_weight,
        );
        Self {
            user_index,
            item_index,
            popularity,
            matrix,
        }
    }
}

/// Trains the model from scratch.
pub fn train<B: BiasModel>(
    ratings: &[Rating],
    baseline: &B,
    hyperparameters: Hyperparameters,
    cancellation: Cancellation,
) -> Result<Model> {
    let mut rng = match hyperparameters.seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    train_with_rng(ratings, baseline, hyperparameters, cancellation, &mut rng)
}

#[instrument(
    level = "info",
    skip_all,
    fields(
        n_ratings = ratings.len(),
        n_features = hyperparameters.n_features(),
        popularity_weight = hyperparameters.popularity_weight(),
    ),
)]
pub fn train_with_rng<B: BiasModel, R: rand::Rng + ?Sized>(
    ratings: &[Rating],
    baseline: &B,
    hyperparameters: Hyperparameters,
    cancellation: Cancellation,
    rng: &mut R,
) -> Result<Model> {
    let start_instant = Instant::now();
    let data = TrainingData::prepare(ratings, baseline, hyperparameters.popularity_weight());

    info!(
        popularity_weight = hyperparameters.popularity_weight(),
        "factorizing the matrix…"
    );
    let factorization = MatrixFactorizer::new(hyperparameters)
        .cancellation(cancellation)
        .factorize(&data.matrix, &data.user_index, &data.item_index, &data.popularity, rng)
        .context("failed to factorize the rating matrix")?;
    if let Some(report) = factorization.reports.last() {
        info!(
            n_epochs = report.epoch,
            rmse = report.rmse,
            is_converged = factorization.is_converged,
            elapsed = %humantime::format_duration(start_instant.elapsed()),
            "trained",
        );
    }

    Ok(Model::new(
        data.user_index,
        data.item_index,
        factorization.user_factors,
        factorization.item_factors,
        vec![1.0; hyperparameters.n_features()],
        data.popularity,
        hyperparameters.popularity_weight(),
    ))
}
