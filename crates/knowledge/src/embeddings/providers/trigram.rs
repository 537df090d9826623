//! Offline embeddings from hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use juris_core::AppResult;
use std::collections::HashMap;

/// Words too common in legal prose to tell passages apart.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "from", "this", "that", "have", "has",
    "had", "its", "their", "they", "them", "which", "shall", "such", "any", "may", "under",
    "been", "being", "who", "whom", "upon", "said",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Vectors come from hashed character trigrams and word frequencies, so
/// passages sharing legal vocabulary ("plaint", "limitation", "decree")
/// land close together without any network access.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, bytes: impl Iterator<Item = u8>, multiplier: u64) -> usize {
        let hash = bytes.fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();

        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_default() += 1;
        }

        let mut embedding = vec![0.0f32; self.dimensions];
        for (word, freq) in &frequencies {
            let freq = *freq as f32;

            // Trigrams carry shared stems ("appeal", "appellate"); sqrt damps repeats
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(trigram.bytes(), 37)] += freq.sqrt();
            }

            embedding[self.bucket(word.bytes(), 31)] += freq;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
