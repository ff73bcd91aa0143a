//! Distance functions behind [`Metric`].

use ndarray::ArrayView1;

use super::{Feature, Metric};

impl Metric {
    /// Distance between two rows of equal length, accumulated in `f64`.
    pub fn distance<F: Feature>(&self, a: ArrayView1<'_, F>, b: ArrayView1<'_, F>) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match *self {
            Metric::Euclidean => euclidean_distance(a, b),
            Metric::Manhattan => minkowski_distance(a, b, 1),
            Metric::Minkowski { p } => minkowski_distance(a, b, p),
            Metric::Cosine => cosine_distance(a, b),
        }
    }
}

pub fn euclidean_distance<F: Feature>(a: ArrayView1<'_, F>, b: ArrayView1<'_, F>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x.as_() - y.as_();
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

/// `(sum |a_i - b_i|^p)^(1/p)`. Empty rows are at distance 0.
pub fn minkowski_distance<F: Feature>(a: ArrayView1<'_, F>, b: ArrayView1<'_, F>, p: u32) -> f64 {
    match p {
        1 => a
            .iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x.as_() - y.as_()).abs())
            .sum(),
        2 => euclidean_distance(a, b),
        _ => {
            let sum_of_powers: f64 = match i32::try_from(p) {
                Ok(exponent) => a
                    .iter()
                    .zip(b.iter())
                    .map(|(&x, &y)| (x.as_() - y.as_()).abs().powi(exponent))
                    .sum(),
                Err(_) => a
                    .iter()
                    .zip(b.iter())
                    .map(|(&x, &y)| (x.as_() - y.as_()).abs().powf(f64::from(p)))
                    .sum(),
            };
            sum_of_powers.powf(1.0 / p as f64)
        }
    }
}

/// Cosine Distance = 1 - Cosine Similarity
///
/// Two zero vectors are at distance 0; a zero vector and a non-zero vector at distance 1.
pub fn cosine_distance<F: Feature>(a: ArrayView1<'_, F>, b: ArrayView1<'_, F>) -> f64 {
    let (dot, norm_a, norm_b) =
        a.iter()
            .zip(b.iter())
            .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, na, nb), (&x, &y)| {
                let (x, y): (f64, f64) = (x.as_(), y.as_());
                (dot + x * y, na + x * x, nb + y * y)
            });
    let (mag_a, mag_b) = (norm_a.sqrt(), norm_b.sqrt());

    if mag_a == 0.0 || mag_b == 0.0 {
        return if mag_a == mag_b { 0.0 } else { 1.0 };
    }

    // Clamp to [-1, 1]; rounding can push the ratio slightly outside.
    let similarity = (dot / (mag_a * mag_b)).clamp(-1.0, 1.0);
    1.0 - similarity
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    #[test]
    fn test_minkowski_distance() {
        let a = array![1.0, 2.0, 3.0];
        let b = array![4.0, 5.0, 6.0];

        // |1-4| + |2-5| + |3-6| = 9
        assert_abs_diff_eq!(minkowski_distance(a.view(), b.view(), 1), 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            minkowski_distance(a.view(), b.view(), 2),
            27.0_f64.sqrt(),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            minkowski_distance(a.view(), b.view(), 3),
            81.0_f64.cbrt(),
            epsilon = 1e-9
        );

        let empty: Array1<f64> = array![];
        assert_abs_diff_eq!(minkowski_distance(empty.view(), empty.view(), 2), 0.0);
    }

    #[test]
    fn test_minkowski_power_past_i32() {
        // A wrapped exponent would turn the zero gap into 1/0.
        let a = array![1.0, 0.0];
        let b = array![0.0, 0.0];
        let p = i32::MAX as u32 + 1;
        assert_abs_diff_eq!(minkowski_distance(a.view(), b.view(), p), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            minkowski_distance(a.view(), b.view(), u32::MAX),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_metric_dispatch() {
        let a = array![0.0_f32, 0.0];
        let b = array![3.0_f32, 4.0];
        assert_abs_diff_eq!(Metric::Euclidean.distance(a.view(), b.view()), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(Metric::Manhattan.distance(a.view(), b.view()), 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            Metric::Minkowski { p: 2 }.distance(a.view(), b.view()),
            5.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cosine_distance() {
        let x = array![1.0, 0.0];
        let y = array![0.0, 2.0];
        let minus_x = array![-3.0, 0.0];
        assert_abs_diff_eq!(cosine_distance(x.view(), x.view()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cosine_distance(x.view(), y.view()), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cosine_distance(x.view(), minus_x.view()), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cosine_distance_zero_vectors() {
        let zero = array![0.0, 0.0];
        let x = array![1.0, 1.0];
        assert_eq!(cosine_distance(zero.view(), zero.view()), 0.0);
        assert_eq!(cosine_distance(zero.view(), x.view()), 1.0);
        assert_eq!(cosine_distance(x.view(), zero.view()), 1.0);
    }

    #[test]
    fn test_distance_on_strided_views() {
        // Column views are non-contiguous; distances must not depend on layout.
        let m = array![[0.0, 1.0], [3.0, 5.0], [4.0, 9.0]];
        let d = Metric::Euclidean.distance(m.column(0), m.column(1));
        // (0-1)^2 + (3-5)^2 + (4-9)^2 = 1 + 4 + 25
        assert_abs_diff_eq!(d, 30.0_f64.sqrt(), epsilon = 1e-12);
    }
}
