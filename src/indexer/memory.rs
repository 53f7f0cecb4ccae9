//! In-process vector index with brute-force cosine search.

use crate::indexer::{HitDocument, IndexSink, IndexedDocument, SearchHit};
use crate::IndexError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Cosine similarity of two vectors
///
/// Returns 1.0 for identical directions and 0.0 for orthogonal vectors,
/// mismatched lengths, or a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[derive(Default)]
struct Store {
    documents: Vec<IndexedDocument>,
    positions: HashMap<String, usize>,
}

/// Index kept in memory for offline runs and tests
///
/// Adding a document whose id already exists replaces it.
#[derive(Default)]
pub struct InMemoryIndex {
    store: RwLock<Store>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every stored document in insertion order
    pub async fn documents(&self) -> Vec<IndexedDocument> {
        self.store.read().await.documents.clone()
    }
}

#[async_trait]
impl IndexSink for InMemoryIndex {
    async fn add(&self, document: &IndexedDocument) -> Result<(), IndexError> {
        let mut store = self.store.write().await;
        match store.positions.get(&document.id).copied() {
            Some(pos) => store.documents[pos] = document.clone(),
            None => {
                let pos = store.documents.len();
                store.positions.insert(document.id.clone(), pos);
                store.documents.push(document.clone());
            }
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let store = self.store.read().await;

        let mut scored: Vec<(usize, f32)> = store
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, cosine_similarity(vector, &doc.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchHit {
                document: HitDocument::Record(store.documents[i].clone()),
                score,
            })
            .collect())
    }
}
