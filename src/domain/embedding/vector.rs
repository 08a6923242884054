//! Vector math shared by the registry and the ranker

/// L2 norm of a vector
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_f64(v) as f32
}

/// Squares are summed in `f64` so components near the `f32` range limits
/// neither overflow nor underflow.
fn l2_norm_f64(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Scales a vector to unit length. A zero-norm vector stays all zeros.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm_f64(v);

    if norm == 0.0 || !norm.is_finite() {
        return vec![0.0; v.len()];
    }

    v.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
}

/// Dot product of two equal-length vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    dot(&normalize(a), &normalize(b))
}

/// Whether every component is a finite number
pub fn is_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}
