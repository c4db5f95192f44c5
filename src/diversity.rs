//! Intra-list similarity of the recommendation lists.

use itertools::Itertools;

use crate::math::vector::cosine_similarity;
use crate::model::Model;
use crate::prelude::*;

/// Mean cosine similarity over the distinct pairs of the listed items.
///
/// Items without a feature vector are ignored. Lists of fewer than two items have zero similarity.
#[must_use]
pub fn intra_list_similarity(model: &Model, item_ids: &[ItemId]) -> f64 {
    let vectors = item_ids
        .iter()
        .filter_map(|item_id| model.item_vector(*item_id))
        .collect_vec();
    let mut similarity = Average::default();
    for (left, right) in vectors.iter().tuple_combinations() {
        similarity.push(cosine_similarity(left, right));
    }
    similarity.average()
}

/// Aggregates the per-list similarities.
///
/// Each evaluation worker keeps its own accumulator, the accumulators are merged at the end.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    pub fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.count += other.count;
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Zero when nothing has been pushed.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.count != 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }
}

impl FromIterator<Average> for Average {
    fn from_iter<T: IntoIterator<Item = Average>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), |mut total, average| {
            total.merge(&average);
            total
        })
    }
}
