//! Item popularity by the number of ratings.

use itertools::{Itertools, MinMaxResult};

use crate::prelude::*;
use crate::rating::Rating;

/// Normalized item popularity from `[0, 5]`. Unknown items have zero popularity.
#[derive(Clone, Debug, Default)]
pub struct ItemPopularity(AHashMap<ItemId, f64>);

impl ItemPopularity {
    pub const MAX: f64 = 5.0;

    #[must_use]
    #[inline]
    pub fn get(&self, item_id: ItemId) -> f64 {
        self.0.get(&item_id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.0.contains_key(&item_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, f64)> + '_ {
        self.0.iter().map(|(item_id, popularity)| (*item_id, *popularity))
    }
}

impl FromIterator<(ItemId, f64)> for ItemPopularity {
    fn from_iter<T: IntoIterator<Item = (ItemId, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Counts the ratings per item and rescales the counts linearly onto `[0, 5]`.
///
/// The least rated items get `0` and the most rated ones get `5`.
/// When all the items have the same number of ratings, every item gets `0`.
#[instrument(level = "debug", skip_all, fields(n_ratings = ratings.len()))]
pub fn calculate_item_popularity(ratings: &[Rating]) -> ItemPopularity {
    let mut counts = AHashMap::<ItemId, usize>::new();
    for rating in ratings {
        *counts.entry(rating.item_id).or_default() += 1;
    }

    let (min_count, max_count) = match counts.values().minmax() {
        MinMaxResult::NoElements => return ItemPopularity::default(),
        MinMaxResult::OneElement(count) => (*count, *count),
        MinMaxResult::MinMax(min, max) => (*min, *max),
    };
    debug!(n_items = counts.len(), min_count, max_count);

    let range = (max_count - min_count) as f64;
    counts
        .into_iter()
        .map(|(item_id, count)| {
            let popularity = if range != 0.0 {
                (count - min_count) as f64 / range * ItemPopularity::MAX
            } else {
                0.0
            };
            (item_id, popularity)
        })
        .collect()
}
