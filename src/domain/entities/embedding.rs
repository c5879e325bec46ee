use serde::{Deserialize, Serialize};

/// Dense vector produced by the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    /// Narrows a provider vector (OpenAI returns `f64`).
    pub fn from_f64(values: &[f64]) -> Self {
        Self(values.iter().map(|x| *x as f32).collect())
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity; 0.0 when dimensions differ, either side is empty or
    /// zero, or the result is not finite.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() || self.0.is_empty() {
            return 0.0;
        }

        let norms = self.norm() * other.norm();
        if norms == 0.0 {
            return 0.0;
        }

        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        let score = dot / norms;
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }
}
