//! Trained factorization model.

use std::sync::RwLock;

use crate::index::KeyIndex;
use crate::math::matrix::Matrix;
use crate::prelude::*;
use crate::trainer::ItemPopularity;

/// Immutable factorization model, shared by the scorers.
///
/// Predictions are `user_vector ⊙ feature_weights · item_vector`.
#[derive(Debug)]
pub struct Model {
    user_index: KeyIndex,
    item_index: KeyIndex,
    user_factors: Matrix,
    item_factors: Matrix,
    feature_weights: Vec<f64>,
    item_popularity: ItemPopularity,
    popularity_weight: f64,
}

impl Model {
    /// # Panics
    ///
    /// Panics when the matrix dimensions disagree with the indices or the feature weights.
    #[must_use]
    pub fn new(
        user_index: KeyIndex,
        item_index: KeyIndex,
        user_factors: Matrix,
        item_factors: Matrix,
        feature_weights: Vec<f64>,
        item_popularity: ItemPopularity,
        popularity_weight: f64,
    ) -> Self {
        assert_eq!(user_factors.n_rows(), user_index.len(), "user matrix has incorrect row count");
        assert_eq!(item_factors.n_rows(), item_index.len(), "item matrix has incorrect row count");
        assert_eq!(
            user_factors.n_columns(),
            feature_weights.len(),
            "user matrix has incorrect column dimension",
        );
        assert_eq!(
            item_factors.n_columns(),
            feature_weights.len(),
            "item matrix has incorrect column dimension",
        );
        Self {
            user_index,
            item_index,
            user_factors,
            item_factors,
            feature_weights,
            item_popularity,
            popularity_weight,
        }
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_weights.len()
    }

    /// Feature vector of the user, `None` if the user is unknown.
    #[must_use]
    pub fn user_vector(&self, user_id: UserId) -> Option<&[f64]> {
        self.user_index
            .index_of(user_id)
            .map(|row| self.user_factors.row(row))
    }

    /// Feature vector of the item, `None` if the item is unknown.
    #[must_use]
    pub fn item_vector(&self, item_id: ItemId) -> Option<&[f64]> {
        self.item_index
            .index_of(item_id)
            .map(|row| self.item_factors.row(row))
    }

    /// Normalized popularity of the item, zero if the item is unknown.
    #[must_use]
    pub fn popularity(&self, item_id: ItemId) -> f64 {
        self.item_popularity.get(item_id)
    }

    #[must_use]
    pub fn feature_weights(&self) -> &[f64] {
        &self.feature_weights
    }

    #[must_use]
    pub const fn popularity_weight(&self) -> f64 {
        self.popularity_weight
    }

    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.user_index.keys()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.item_index.keys()
    }
}

/// Current model, replaced wholesale on retraining.
#[derive(Debug, Default)]
pub struct ModelHandle(RwLock<Option<Arc<Model>>>);

impl ModelHandle {
    #[must_use]
    pub fn new(model: Model) -> Self {
        Self(RwLock::new(Some(Arc::new(model))))
    }

    /// Returns the current model, if any. The returned model stays valid after a replacement.
    pub fn get(&self) -> Result<Option<Arc<Model>>> {
        let model = self.0.read().map_err(|_| anyhow!("model lock is poisoned"))?;
        Ok(model.clone())
    }

    /// Swaps in the freshly trained model and returns the previous one.
    pub fn replace(&self, model: Model) -> Result<Option<Arc<Model>>> {
        let mut current = self.0.write().map_err(|_| anyhow!("model lock is poisoned"))?;
        Ok(current.replace(Arc::new(model)))
    }
}
