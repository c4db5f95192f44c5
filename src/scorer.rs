//! Blends the latent feature prediction, the baseline and the item popularity.

use std::cmp::Ordering;

use crate::bias::BiasModel;
use crate::math::vector::weighted_dot;
use crate::model::Model;
use crate::prelude::*;

pub struct Scorer<'a, B> {
    model: &'a Model,
    baseline: B,
}

impl<'a, B: BiasModel> Scorer<'a, B> {
    pub fn new(model: &'a Model, baseline: B) -> Self {
        Self { model, baseline }
    }

    /// Scores the items for the user.
    ///
    /// An unknown user gets no scores at all, and unknown items are left out of the result.
    #[instrument(level = "debug", skip_all, fields(user_id = user_id))]
    pub fn score(
        &self,
        user_id: UserId,
        item_ids: impl IntoIterator<Item = ItemId>,
    ) -> AHashMap<ItemId, f64> {
        let user_vector = match self.model.user_vector(user_id) {
            Some(user_vector) => user_vector,
            None => {
                debug!(user_id, "unknown user");
                return AHashMap::new();
            }
        };
        item_ids
            .into_iter()
            .filter_map(|item_id| {
                let item_vector = self.model.item_vector(item_id)?;
                Some((item_id, self.blend(user_id, user_vector, item_id, item_vector)))
            })
            .collect()
    }

    /// Scores all the known items except the excluded ones
    /// and returns the `n` best in the descending order of the scores.
    #[instrument(level = "debug", skip_all, fields(user_id = user_id, n = n))]
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
        exclude: &AHashSet<ItemId>,
    ) -> Vec<(ItemId, f64)> {
        let candidates = self
            .model
            .item_ids()
            .filter(|item_id| !exclude.contains(item_id));
        let mut recommendations = self.score(user_id, candidates).into_iter().collect::<Vec<_>>();
        recommendations.sort_unstable_by(|(lhs_id, lhs), (rhs_id, rhs)| {
            match rhs.total_cmp(lhs) {
                Ordering::Equal => lhs_id.cmp(rhs_id),
                ordering => ordering,
            }
        });
        recommendations.truncate(n);
        recommendations
    }

    fn blend(
        &self,
        user_id: UserId,
        user_vector: &[f64],
        item_id: ItemId,
        item_vector: &[f64],
    ) -> f64 {
        let prediction = weighted_dot(user_vector, self.model.feature_weights(), item_vector)
            + self.baseline.baseline(user_id, item_id);
        let popularity_weight = self.model.popularity_weight();
        (1.0 - popularity_weight) * prediction + popularity_weight * self.model.popularity(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bias::UserItemBiasModel;
    use crate::model::tests::model;

    fn baseline() -> UserItemBiasModel {
        UserItemBiasModel::new(3.0)
            .with_user_bias(1, 0.5)
            .with_item_bias(20, -1.0)
    }

    #[test]
    fn score_without_popularity_ok() {
        let model = model(0.0);
        let scores = Scorer::new(&model, baseline()).score(1, [10, 20, 30]);
        assert_eq!(scores.len(), 3);
        // [1, 2] · [1, 0] + 3 + 0.5
        assert!((scores[&10] - 4.5).abs() < 1e-12);
        // [1, 2] · [0, 1] + 3 + 0.5 - 1
        assert!((scores[&20] - 4.5).abs() < 1e-12);
        // [1, 2] · [2, 2] + 3 + 0.5
        assert!((scores[&30] - 9.5).abs() < 1e-12);
    }

    #[test]
    fn score_blended_ok() {
        let model = model(0.4);
        let scores = Scorer::new(&model, baseline()).score(2, [10]);
        // [0.5, -1] · [1, 0] + 3 → 3.5, blended with the popularity of 5.
        assert!((scores[&10] - (0.6 * 3.5 + 0.4 * 5.0)).abs() < 1e-12);
    }

    #[test]
    fn score_popularity_only_ok() {
        let model = model(1.0);
        let scores = Scorer::new(&model, baseline()).score(1, [10, 20, 30]);
        assert_eq!(scores[&10], 5.0);
        assert_eq!(scores[&20], 0.0);
        assert_eq!(scores[&30], 2.5);
    }

    #[test]
    fn feature_weights_are_applied_ok() {
        let model = model(0.0);
        let scorer = Scorer::new(&model, UserItemBiasModel::new(0.0));
        let expected = weighted_dot(
            model.user_vector(1).unwrap(),
            model.feature_weights(),
            model.item_vector(30).unwrap(),
        );
        assert!((scorer.score(1, [30])[&30] - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_user_ok() {
        let model = model(0.0);
        assert!(Scorer::new(&model, baseline()).score(42, [10, 20]).is_empty());
    }

    #[test]
    fn unknown_item_ok() {
        let model = model(0.0);
        let scores = Scorer::new(&model, baseline()).score(1, [10, 40]);
        assert_eq!(scores.len(), 1);
        assert!(scores.contains_key(&10));
        assert!(!scores.contains_key(&40));
    }

    #[test]
    fn recommend_ok() {
        let model = model(0.0);
        let scorer = Scorer::new(&model, baseline());
        assert_eq!(
            scorer.recommend(1, 2, &AHashSet::new()),
            vec![(30, 9.5), (10, 4.5)],
        );
        let exclude = [30].into_iter().collect();
        assert_eq!(scorer.recommend(1, 10, &exclude), vec![(10, 4.5), (20, 4.5)]);
        assert!(scorer.recommend(42, 10, &AHashSet::new()).is_empty());
    }
}
