//! SIMD-accelerated vector kernels over `f64`.
//!
//! Uses NEON intrinsics on aarch64 (two lanes per register), with a scalar
//! fallback for other architectures (auto-vectorized by LLVM).

/// Distance metric between two dense vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Squared Euclidean distance: sum((a[i] - b[i])^2).
    L2,
    /// Cosine distance: 1 - (a . b) / (|a| * |b|).
    Cosine,
}

impl DistanceMetric {
    #[inline]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            DistanceMetric::L2 => l2_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
        }
    }
}

/// Inner product.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "aarch64")]
    {
        dot_neon(a, b)
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        dot_scalar(a, b)
    }
}

/// Euclidean norm.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Squared L2 (Euclidean) distance.
#[inline]
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "aarch64")]
    {
        l2_neon(a, b)
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        l2_scalar(a, b)
    }
}

/// Cosine distance: 1.0 - cosine_similarity. Zero vectors are at distance 1.
#[inline]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let denom = (dot(a, a) * dot(b, b)).sqrt();
    if denom == 0.0 {
        1.0
    } else {
        1.0 - dot(a, b) / denom
    }
}

// ---- Scalar implementations ----

#[allow(dead_code)]
fn dot_scalar(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[allow(dead_code)]
fn l2_scalar(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ---- NEON implementations (aarch64) ----

#[cfg(target_arch = "aarch64")]
fn dot_neon(a: &[f64], b: &[f64]) -> f64 {
    use core::arch::aarch64::*;

    let n = a.len().min(b.len());
    let chunks = n / 2;
    let sum;

    // SAFETY: We read exactly `chunks * 2` f64 values from both slices.
    unsafe {
        let mut acc = vdupq_n_f64(0.0);
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        for i in 0..chunks {
            let va = vld1q_f64(pa.add(i * 2));
            let vb = vld1q_f64(pb.add(i * 2));
            acc = vfmaq_f64(acc, va, vb);
        }
        sum = vaddvq_f64(acc);
    }

    let mut tail = sum;
    for i in (chunks * 2)..n {
        tail += a[i] * b[i];
    }
    tail
}

#[cfg(target_arch = "aarch64")]
fn l2_neon(a: &[f64], b: &[f64]) -> f64 {
    use core::arch::aarch64::*;

    let n = a.len().min(b.len());
    let chunks = n / 2;
    let sum;

    // SAFETY: We read exactly `chunks * 2` f64 values from both slices.
    unsafe {
        let mut acc = vdupq_n_f64(0.0);
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        for i in 0..chunks {
            let va = vld1q_f64(pa.add(i * 2));
            let vb = vld1q_f64(pb.add(i * 2));
            let diff = vsubq_f64(va, vb);
            acc = vfmaq_f64(acc, diff, diff);
        }
        sum = vaddvq_f64(acc);
    }

    let mut tail = sum;
    for i in (chunks * 2)..n {
        let d = a[i] - b[i];
        tail += d * d;
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_known_vectors() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let d = l2_distance(&a, &b);
        assert!((d - 2.0).abs() < 1e-12, "L2([1,0,0], [0,1,0]) = {d}, expected 2.0");
    }

    #[test]
    fn l2_identical() {
        let a = [1.0, 2.0, 3.0];
        assert_eq!(l2_distance(&a, &a), 0.0);
    }

    #[test]
    fn dot_and_norm() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
        assert_eq!(norm(&[]), 0.0);
    }

    #[test]
    fn cosine_orthogonal() {
        let d = cosine_distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!((d - 1.0).abs() < 1e-12, "cosine orthogonal = {d}, expected 1.0");
    }

    #[test]
    fn cosine_identical() {
        let a = [1.0, 2.0, 3.0];
        let d = cosine_distance(&a, &a);
        assert!(d.abs() < 1e-12, "cosine identical = {d}, expected ~0.0");
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_distance(&[0.0; 3], &[1.0, 2.0, 3.0]), 1.0);
    }

    #[test]
    fn high_dim_consistency() {
        // Odd length exercises the scalar tail after the SIMD lanes.
        let dim = 129;
        let a: Vec<f64> = (0..dim).map(|i| i as f64 * 0.1).collect();
        let b: Vec<f64> = (0..dim).map(|i| (i as f64 * 0.1) + 0.5).collect();

        let l2 = l2_distance(&a, &b);
        assert!((l2 - 32.25).abs() < 1e-9, "L2 129-d = {l2}, expected 32.25");

        let cos = cosine_distance(&a, &b);
        assert!((0.0..=1.0).contains(&cos), "cosine 129-d = {cos}, out of range");
    }

    #[test]
    fn metric_dispatch() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((DistanceMetric::L2.distance(&a, &b) - 2.0).abs() < 1e-12);
        assert!((DistanceMetric::Cosine.distance(&a, &b) - 1.0).abs() < 1e-12);
    }
}
