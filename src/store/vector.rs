// Similarity scoring for vector search.

use super::traits::Similarity;
use serde_json::Value;

/// Cosine similarity in `-1.0..=1.0`; 0.0 for empty, mismatched or zero
/// vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !denom.is_finite() || denom < f64::EPSILON {
        return 0.0;
    }

    let raw = dot / denom;
    if !raw.is_finite() {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let sim = raw.clamp(-1.0, 1.0) as f32;
    sim
}

fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Search score in `0.0..=1.0`, higher is closer.
///
/// Cosine and dot product map `[-1, 1]` onto `[0, 1]`; euclidean uses
/// `1 / (1 + distance)`.
pub fn score(similarity: Similarity, a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let raw = match similarity {
        Similarity::Cosine => f64::from(cosine_similarity(a, b)).mul_add(0.5, 0.5),
        Similarity::DotProduct => dot_product(a, b).clamp(-1.0, 1.0).mul_add(0.5, 0.5),
        Similarity::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
    };
    #[allow(clippy::cast_possible_truncation)]
    let score = raw as f32;
    if score.is_finite() { score } else { 0.0 }
}

/// Read a JSON array of numbers as an embedding.
#[allow(clippy::cast_possible_truncation)]
pub fn vector_from_json(value: &Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_f64().map(|f| f as f32))
        .collect()
}

pub fn vector_to_json(vector: &[f32]) -> Value {
    Value::Array(
        vector
            .iter()
            .map(|f| serde_json::Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number))
            .collect(),
    )
}
