//! Feature-hashing text embedder.
//!
//! Maps character trigrams and whole words into a fixed number of buckets and
//! L2-normalizes the result. No model, no network: texts that share words or
//! spelling land close to each other, which is enough for offline runs and
//! tests.

use crate::collaborators::Embedder;
use lookbook_core::{Error, Result, Vector};
use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_EMBEDDING_DIM: usize = 256;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn bucket(&self, token: &str) -> usize {
        (xxh3_64(token.as_bytes()) % self.dim as u64) as usize
    }

    fn hash_text(&self, text: &str) -> Vector {
        let mut counts = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();

        for trigram in generate_trigrams(&lowered) {
            counts[self.bucket(&trigram)] += 1.0;
        }

        // Words contribute more than fragments
        for word in lowered.split_whitespace() {
            counts[self.bucket(word)] += 2.0;
        }

        Vector::new(counts).normalized()
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vector> {
        Ok(self.hash_text(text))
    }

    fn model_id(&self) -> String {
        format!("hashing-xxh3/{}", self.dim)
    }
}

/// Character trigrams, padded so short words still produce some.
fn generate_trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return HashSet::new();
    }

    chars.windows(3).map(|w| w.iter().collect::<String>()).collect()
}
