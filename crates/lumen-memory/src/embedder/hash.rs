use crate::embedder::Embedder;
use crate::error::MemoryError;
use crate::vector_store::BoxFuture;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Offline embedder based on feature hashing.
///
/// Lowercased word tokens and their character trigrams are hashed with blake3 into
/// `dimension` signed buckets, then the vector is L2-normalized. Identical texts map to
/// identical vectors and texts sharing vocabulary score higher under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self, MemoryError> {
        if dimension == 0 {
            return Err(MemoryError::Embedding(
                "embedding dimension must be positive".into(),
            ));
        }
        Ok(Self { dimension })
    }

    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lower = text.to_lowercase();

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            self.add_feature(&mut vector, token.as_bytes(), WORD_WEIGHT);

            let padded: Vec<char> = format!("^{token}$").chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = blake3::hash(feature);
        let bytes = hash.as_bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&bytes[..8]);
        let bucket = u64::from_le_bytes(head) % self.dimension as u64;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        #[expect(clippy::cast_possible_truncation)]
        let idx = bucket as usize;
        vector[idx] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, MemoryError>> {
        let vector = self.encode(text);
        Box::pin(async move { Ok(vector) })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "hash"
    }
}
