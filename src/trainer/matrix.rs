//! Dense residual matrix of the observed ratings.

use crate::bias::BiasModel;
use crate::index::KeyIndex;
use crate::math::matrix::Matrix;
use crate::prelude::*;
use crate::rating::Rating;
use crate::trainer::popularity::ItemPopularity;

/// Users × items matrix of popularity-blended residuals.
///
/// Only the cells written from a positive rating are observed,
/// the rest stay at zero and are skipped by the training.
#[derive(Clone, Debug)]
pub struct RatingMatrix {
    values: Matrix,
    observed: Vec<bool>,
    n_observed: usize,
}

impl RatingMatrix {
    #[must_use]
    pub fn new(n_users: usize, n_items: usize) -> Self {
        Self {
            values: Matrix::zeros(n_users, n_items),
            observed: vec![false; n_users * n_items],
            n_observed: 0,
        }
    }

    #[must_use]
    pub const fn n_users(&self) -> usize {
        self.values.n_rows()
    }

    #[must_use]
    pub const fn n_items(&self) -> usize {
        self.values.n_columns()
    }

    /// Number of distinct observed cells.
    #[must_use]
    pub const fn n_observed(&self) -> usize {
        self.n_observed
    }

    #[must_use]
    #[inline]
    pub fn get(&self, user_row: usize, item_column: usize) -> f64 {
        self.values.get(user_row, item_column)
    }

    #[must_use]
    #[inline]
    pub fn is_observed(&self, user_row: usize, item_column: usize) -> bool {
        self.observed[user_row * self.n_items() + item_column]
    }

    /// Records the observation, the last write wins.
    pub fn observe(&mut self, user_row: usize, item_column: usize, value: f64) {
        let offset = user_row * self.n_items() + item_column;
        if !self.observed[offset] {
            self.observed[offset] = true;
            self.n_observed += 1;
        }
        self.values.set(user_row, item_column, value);
    }

    /// Iterates over the observed cells in the row-major order.
    pub fn observed_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n_items = self.n_items();
        self.observed
            .iter()
            .enumerate()
            .filter(|(_, is_observed)| **is_observed)
            .map(move |(offset, _)| {
                let (user_row, item_column) = (offset / n_items, offset % n_items);
                (user_row, item_column, self.values.get(user_row, item_column))
            })
    }
}

/// Blends the bias-subtracted rating with the item popularity:
/// `(1 - w) × (rating - baseline) + w × popularity`.
#[must_use]
#[inline]
pub fn blend_residual(residual: f64, popularity: f64, popularity_weight: f64) -> f64 {
    (1.0 - popularity_weight) * residual + popularity_weight * popularity
}

/// Writes every positive rating into the users × items matrix as a blended residual.
#[instrument(level = "debug", skip_all)]
pub fn build_rating_matrix<B: BiasModel>(
    ratings: &[Rating],
    user_index: &KeyIndex,
    item_index: &KeyIndex,
    baseline: &B,
    popularity: &ItemPopularity,
    popularity_weight: f64,
) -> RatingMatrix {
    info!(n_users = user_index.len(), n_items = item_index.len(), "creating the rating matrix…");
    let mut matrix = RatingMatrix::new(user_index.len(), item_index.len());
    let mut n_unmapped = 0_usize;

    for rating in ratings.iter().filter(|rating| rating.is_observed()) {
        let (user_row, item_column) = match (
            user_index.index_of(rating.user_id),
            item_index.index_of(rating.item_id),
        ) {
            (Some(user_row), Some(item_column)) => (user_row, item_column),
            _ => {
                n_unmapped += 1;
                continue;
            }
        };
        let residual = rating.value - baseline.baseline(rating.user_id, rating.item_id);
        let blended = blend_residual(residual, popularity.get(rating.item_id), popularity_weight);
        matrix.observe(user_row, item_column, blended);
    }

    if n_unmapped != 0 {
        warn!(n_unmapped, "skipped the ratings of unmapped users or items");
    }
    debug!(n_observed = matrix.n_observed());
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bias::UserItemBiasModel;
    use crate::trainer::popularity::calculate_item_popularity;

    fn ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 10, 4.0),
            Rating::new(1, 20, 2.0),
            Rating::new(2, 10, 5.0),
            Rating::new(2, 30, 0.0),
        ]
    }

    fn indices(ratings: &[Rating]) -> (KeyIndex, KeyIndex) {
        (
            KeyIndex::from_keys(ratings.iter().map(|rating| rating.user_id)),
            KeyIndex::from_keys(ratings.iter().map(|rating| rating.item_id)),
        )
    }

    #[test]
    fn plain_residuals_ok() {
        let ratings = ratings();
        let (users, items) = indices(&ratings);
        let baseline = UserItemBiasModel::new(3.0)
            .with_user_bias(2, 0.5)
            .with_item_bias(10, 0.25);
        let popularity = calculate_item_popularity(&ratings);
        let matrix = build_rating_matrix(&ratings, &users, &items, &baseline, &popularity, 0.0);

        assert_eq!((matrix.n_users(), matrix.n_items()), (2, 3));
        assert_eq!(matrix.n_observed(), 3);
        assert!((matrix.get(0, 0) - 0.75).abs() < 1e-12);
        assert!((matrix.get(0, 1) + 1.0).abs() < 1e-12);
        assert!((matrix.get(1, 0) - 1.25).abs() < 1e-12);
        assert!(!matrix.is_observed(1, 2));
        assert_eq!(matrix.get(1, 2), 0.0);
    }

    #[test]
    fn popularity_blending_ok() {
        let ratings = ratings();
        let (users, items) = indices(&ratings);
        let baseline = UserItemBiasModel::new(3.0);
        let popularity = calculate_item_popularity(&ratings);
        let matrix = build_rating_matrix(&ratings, &users, &items, &baseline, &popularity, 0.4);

        // Item 10 is the most popular one (5.0), item 20 is the least (0.0).
        assert!((matrix.get(0, 0) - (0.6 * 1.0 + 0.4 * 5.0)).abs() < 1e-12);
        assert!((matrix.get(0, 1) - 0.6 * -1.0).abs() < 1e-12);
    }

    #[test]
    fn full_popularity_weight_ok() {
        let ratings = ratings();
        let (users, items) = indices(&ratings);
        let popularity = calculate_item_popularity(&ratings);
        let matrix = build_rating_matrix(
            &ratings,
            &users,
            &items,
            &UserItemBiasModel::new(3.0),
            &popularity,
            1.0,
        );
        for (_, item_column, value) in matrix.observed_cells() {
            let item_id = items.key_at(item_column).unwrap();
            assert!((value - popularity.get(item_id)).abs() < 1e-12);
        }
    }

    #[test]
    fn last_write_wins_ok() {
        let ratings = [Rating::new(1, 10, 2.0), Rating::new(1, 10, 4.0)];
        let (users, items) = indices(&ratings);
        let matrix = build_rating_matrix(
            &ratings,
            &users,
            &items,
            &UserItemBiasModel::new(0.0),
            &ItemPopularity::default(),
            0.0,
        );
        assert_eq!(matrix.n_observed(), 1);
        assert_eq!(matrix.get(0, 0), 4.0);
    }

    #[test]
    fn zero_residual_is_observed_ok() {
        let ratings = [Rating::new(1, 10, 3.0)];
        let (users, items) = indices(&ratings);
        let matrix = build_rating_matrix(
            &ratings,
            &users,
            &items,
            &UserItemBiasModel::new(3.0),
            &ItemPopularity::default(),
            0.0,
        );
        assert_eq!(matrix.observed_cells().collect::<Vec<_>>(), vec![(0, 0, 0.0)]);
    }

    #[test]
    fn unmapped_ids_are_skipped_ok() {
        let ratings = [Rating::new(1, 10, 3.0), Rating::new(2, 10, 3.0)];
        let users = KeyIndex::from_keys([1]);
        let items = KeyIndex::from_keys([10]);
        let matrix = build_rating_matrix(
            &ratings,
            &users,
            &items,
            &UserItemBiasModel::new(0.0),
            &ItemPopularity::default(),
            0.0,
        );
        assert_eq!(matrix.n_observed(), 1);
    }
}
