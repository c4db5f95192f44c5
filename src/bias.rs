//! Baseline bias models used to de-mean the ratings.

use itertools::Itertools;

use crate::prelude::*;
use crate::rating::Rating;

/// Additive global, per-user and per-item offsets.
pub trait BiasModel {
    fn intercept(&self) -> f64;

    fn user_bias(&self, user_id: UserId) -> f64;

    fn item_bias(&self, item_id: ItemId) -> f64;

    /// Baseline estimate of the user's rating for the item.
    fn baseline(&self, user_id: UserId, item_id: ItemId) -> f64 {
        self.intercept() + self.user_bias(user_id) + self.item_bias(item_id)
    }
}

impl<T: BiasModel + ?Sized> BiasModel for &T {
    fn intercept(&self) -> f64 {
        (**self).intercept()
    }

    fn user_bias(&self, user_id: UserId) -> f64 {
        (**self).user_bias(user_id)
    }

    fn item_bias(&self, item_id: ItemId) -> f64 {
        (**self).item_bias(item_id)
    }
}

/// Bias model backed by explicit offset tables. Unknown IDs have zero bias.
#[derive(Clone, Debug, Default)]
pub struct UserItemBiasModel {
    intercept: f64,
    user_biases: AHashMap<UserId, f64>,
    item_biases: AHashMap<ItemId, f64>,
}

impl UserItemBiasModel {
    #[must_use]
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_user_bias(mut self, user_id: UserId, bias: f64) -> Self {
        self.user_biases.insert(user_id, bias);
        self
    }

    #[must_use]
    pub fn with_item_bias(mut self, item_id: ItemId, bias: f64) -> Self {
        self.item_biases.insert(item_id, bias);
        self
    }

    /// Fits the damped global mean, item and user offsets.
    ///
    /// The item offsets are computed against the global mean, and the user offsets are
    /// computed against the global mean plus the item offsets.
    /// `damping` pulls the offsets of the sparsely rated entities towards zero.
    #[instrument(level = "debug", skip_all, fields(n_ratings = ratings.len()))]
    pub fn fit(ratings: &[Rating], damping: f64) -> Result<Self> {
        if !(damping.is_finite() && damping >= 0.0) {
            bail!("damping must be a non-negative number, got {}", damping);
        }
        let observed = ratings.iter().filter(|rating| rating.is_observed()).collect_vec();
        if observed.is_empty() {
            bail!("cannot fit the bias model without positive ratings");
        }

        let intercept =
            observed.iter().map(|rating| rating.value).sum::<f64>() / observed.len() as f64;
        let item_biases = damped_means(
            observed
                .iter()
                .map(|rating| (rating.item_id, rating.value - intercept)),
            damping,
        );
        let user_biases = damped_means(
            observed.iter().map(|rating| {
                let item_bias = item_biases.get(&rating.item_id).copied().unwrap_or_default();
                (rating.user_id, rating.value - intercept - item_bias)
            }),
            damping,
        );

        debug!(intercept, n_users = user_biases.len(), n_items = item_biases.len(), "fitted");
        Ok(Self {
            intercept,
            user_biases,
            item_biases,
        })
    }
}

fn damped_means(residuals: impl Iterator<Item = (i64, f64)>, damping: f64) -> AHashMap<i64, f64> {
    let mut sums = AHashMap::<i64, (f64, usize)>::new();
    for (key, residual) in residuals {
        let (sum, count) = sums.entry(key).or_default();
        *sum += residual;
        *count += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / (count as f64 + damping)))
        .collect()
}

impl BiasModel for UserItemBiasModel {
    fn intercept(&self) -> f64 {
        self.intercept
    }

    fn user_bias(&self, user_id: UserId) -> f64 {
        self.user_biases.get(&user_id).copied().unwrap_or_default()
    }

    fn item_bias(&self, item_id: ItemId) -> f64 {
        self.item_biases.get(&item_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_ok() {
        let model = UserItemBiasModel::new(3.0)
            .with_user_bias(1, 0.5)
            .with_item_bias(10, -0.25);
        assert!((model.baseline(1, 10) - 3.25).abs() < f64::EPSILON);
        assert!((model.baseline(2, 10) - 2.75).abs() < f64::EPSILON);
        assert!((model.baseline(2, 20) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fit_undamped_ok() -> Result {
        let ratings = [
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 3.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 20, 0.0),
        ];
        let model = UserItemBiasModel::fit(&ratings, 0.0)?;
        assert!((model.intercept() - 4.0).abs() < 1e-12);
        assert!((model.item_bias(10) - 0.5).abs() < 1e-12);
        assert!((model.item_bias(20) + 1.0).abs() < 1e-12);
        // User 1: (5 - 4 - 0.5) and (3 - 4 + 1) → mean 0.25.
        assert!((model.user_bias(1) - 0.25).abs() < 1e-12);
        // User 2: only the positive rating counts.
        assert!((model.user_bias(2) + 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn fit_damped_ok() -> Result {
        let ratings = [Rating::new(1, 10, 5.0), Rating::new(2, 20, 3.0)];
        let model = UserItemBiasModel::fit(&ratings, 1.0)?;
        assert!((model.item_bias(10) - 0.5).abs() < 1e-12);
        assert!((model.item_bias(20) + 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn fit_empty_fails() {
        assert!(UserItemBiasModel::fit(&[Rating::new(1, 1, 0.0)], 0.0).is_err());
        assert!(UserItemBiasModel::fit(&[Rating::new(1, 1, 1.0)], -1.0).is_err());
    }
}
