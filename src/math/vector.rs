pub type Vector = Vec<f64>;

#[must_use]
pub fn norm(x: &[f64]) -> f64 {
    x.iter().map(|xi| xi * xi).sum::<f64>().sqrt()
}

#[must_use]
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).fold(0.0, |dot, (xi, yi)| dot + xi * yi)
}

/// Dot product of `x ⊙ weights` and `y`.
#[must_use]
#[inline]
pub fn weighted_dot(x: &[f64], weights: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), weights.len());
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(weights)
        .zip(y)
        .fold(0.0, |dot, ((xi, wi), yi)| dot + xi * wi * yi)
}

/// Returns `0.0` when either of the vectors is zero.
#[must_use]
pub fn cosine_similarity(x: &[f64], y: &[f64]) -> f64 {
    let denominator = norm(x) * norm(y);
    if denominator != 0.0 {
        dot(x, y) / denominator
    } else {
        0.0
    }
}

#[must_use]
pub fn is_finite(x: &[f64]) -> bool {
    x.iter().all(|xi| xi.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_ok() {
        let vector_1 = [1.0, 2.0, 3.0];
        let vector_2 = [3.0, 5.0, 7.0];
        let similarity = cosine_similarity(&vector_1, &vector_2);
        assert!((similarity - 0.9974149030430578).abs() < f64::EPSILON);
    }

    #[test]
    fn cosine_similarity_zero_vector_ok() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn weighted_dot_ok() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 5.0, 6.0];
        assert!((weighted_dot(&x, &[1.0, 1.0, 1.0], &y) - dot(&x, &y)).abs() < f64::EPSILON);
        assert!((weighted_dot(&x, &[0.5, 0.0, 2.0], &y) - 38.0).abs() < f64::EPSILON);
    }

    #[test]
    fn is_finite_ok() {
        assert!(is_finite(&[0.0, -1.0, 1e300]));
        assert!(!is_finite(&[0.0, f64::NAN]));
        assert!(!is_finite(&[f64::INFINITY]));
    }
}
