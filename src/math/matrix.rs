//! Row-major dense matrix.

use rand::Rng;

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    n_rows: usize,
    n_columns: usize,
    values: Vec<f64>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(n_rows: usize, n_columns: usize) -> Self {
        Self {
            n_rows,
            n_columns,
            values: vec![0.0; n_rows * n_columns],
        }
    }

    /// Fills the matrix with independent uniform values from `[0, upper)`.
    pub fn random<R: Rng + ?Sized>(
        n_rows: usize,
        n_columns: usize,
        upper: f64,
        rng: &mut R,
    ) -> Self {
        let values = (0..n_rows * n_columns)
            .map(|_| rng.gen::<f64>() * upper)
            .collect();
        Self {
            n_rows,
            n_columns,
            values,
        }
    }

    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub const fn n_columns(&self) -> usize {
        self.n_columns
    }

    #[must_use]
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[self.offset(row, column)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        let offset = self.offset(row, column);
        self.values[offset] = value;
    }

    #[must_use]
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_columns;
        &self.values[start..start + self.n_columns]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.n_columns;
        &mut self.values[start..start + self.n_columns]
    }

    #[inline]
    fn offset(&self, row: usize, column: usize) -> usize {
        debug_assert!(row < self.n_rows && column < self.n_columns);
        row * self.n_columns + column
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn set_and_row_ok() {
        let mut matrix = Matrix::zeros(2, 3);
        matrix.set(1, 2, 5.0);
        matrix.row_mut(0)[1] = 3.0;
        assert_eq!(matrix.row(0), &[0.0, 3.0, 0.0]);
        assert_eq!(matrix.row(1), &[0.0, 0.0, 5.0]);
        assert_eq!(matrix.get(1, 2), 5.0);
    }

    #[test]
    fn random_range_ok() {
        let matrix = Matrix::random(10, 4, 0.1, &mut StdRng::seed_from_u64(42));
        for row in 0..matrix.n_rows() {
            assert!(matrix.row(row).iter().all(|value| (0.0..0.1).contains(value)));
        }
    }

    #[test]
    fn random_is_reproducible_ok() {
        let left = Matrix::random(3, 2, 0.1, &mut StdRng::seed_from_u64(7));
        let right = Matrix::random(3, 2, 0.1, &mut StdRng::seed_from_u64(7));
        assert_eq!(left, right);
    }
}
