/// Accumulates the squared residual errors of an epoch.
#[derive(Default, Debug, Copy, Clone)]
pub struct SquaredError {
    total: f64,
    count: usize,
}

impl SquaredError {
    #[inline]
    pub fn push(&mut self, residual_error: f64) {
        self.total += residual_error * residual_error;
        self.count += 1;
    }

    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Root mean squared error, zero for an empty epoch.
    #[must_use]
    pub fn rmse(&self) -> f64 {
        (self.total / self.count.max(1) as f64).sqrt()
    }
}
