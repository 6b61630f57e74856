//! L2 math shared by the embedding backends.
//!
//! Instructor-family models are trained for cosine retrieval, so every
//! embedding leaves a backend with unit length.

/// Euclidean length of `v`.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x.powi(2)).sum::<f32>().sqrt()
}

/// Scale `v` in place to unit length.
///
/// An all-zero vector has no direction and is left untouched rather
/// than divided into NaN.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v {
            *x /= norm;
        }
    }
}
