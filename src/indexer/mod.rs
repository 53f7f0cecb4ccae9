//! Chunk indexing: embedding plus submission to the indexing service
//!
//! The crawler is a pure producer here. Each chunk is embedded by an
//! [`Embedder`] and sent to an [`IndexSink`] as an [`IndexedDocument`].
//! A failure on one chunk is logged and counted, and never stops the chunks
//! that follow it.

mod client;
mod embedder;
mod memory;

pub use client::HttpIndexClient;
pub use embedder::{build_embedder, HashingEmbedder, HttpEmbedder};
pub use memory::{cosine_similarity, InMemoryIndex};

use crate::crawler::TextChunk;
use crate::{EmbeddingError, IndexError, SubmitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Document record accepted by the indexing service's `/add` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub vector: Vec<f32>,
    /// Preview text, not the full chunk
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Document half of a search result
///
/// Services return either full document records or arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HitDocument {
    Record(IndexedDocument),
    Other(serde_json::Value),
}

/// One nearest-neighbour result, most similar first
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document: HitDocument,
    pub score: f32,
}

impl SearchHit {
    /// Document identifier, when the service returned one
    pub fn id(&self) -> Option<&str> {
        match &self.document {
            HitDocument::Record(doc) => Some(doc.id.as_str()),
            HitDocument::Other(value) => value.get("id").and_then(|v| v.as_str()),
        }
    }

    /// Human-readable text for display
    pub fn display_text(&self) -> String {
        match &self.document {
            HitDocument::Record(doc) => match &doc.url {
                Some(url) => format!("{} ({})", doc.content, url),
                None => doc.content.clone(),
            },
            HitDocument::Other(serde_json::Value::String(s)) => s.clone(),
            HitDocument::Other(value) => value.to_string(),
        }
    }
}

/// Maps text to a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;
}

/// Remote (or in-process) vector store
#[async_trait]
pub trait IndexSink: Send + Sync {
    async fn add(&self, document: &IndexedDocument) -> Result<(), IndexError>;

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError>;
}

/// Deterministic document id for a chunk
///
/// Derived from the source URL and the chunk's position on that page, so a
/// re-crawl overwrites instead of duplicating.
pub fn document_id(url: &str, ordinal: usize) -> String {
    format!("{}_{}", url, ordinal)
}

/// Counts of one page's chunk submissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageIndexOutcome {
    pub submitted: usize,
    pub failed: usize,
}

/// Embeds chunks and forwards them to the index
#[derive(Clone)]
pub struct ChunkIndexer {
    embedder: Arc<dyn Embedder>,
    sink: Arc<dyn IndexSink>,
}

impl ChunkIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, sink: Arc<dyn IndexSink>) -> Self {
        Self { embedder, sink }
    }

    /// Embeds one chunk and submits its document record
    ///
    /// Vectors whose length differs from the embedder's declared dimensions
    /// are rejected before they reach the index.
    pub async fn submit(&self, chunk: &TextChunk) -> Result<(), SubmitError> {
        let vector = self.embedder.embed(&chunk.text).await?;
        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(EmbeddingError::Dimension {
                expected,
                actual: vector.len(),
            }
            .into());
        }

        let document = IndexedDocument {
            id: document_id(chunk.url.as_str(), chunk.ordinal),
            vector,
            content: chunk.preview.clone(),
            url: Some(chunk.url.to_string()),
        };

        self.sink.add(&document).await?;
        Ok(())
    }

    /// Submits every chunk in order, isolating failures per chunk
    pub async fn index_page<I>(&self, chunks: I) -> PageIndexOutcome
    where
        I: IntoIterator<Item = TextChunk>,
    {
        let mut outcome = PageIndexOutcome::default();

        for chunk in chunks {
            match self.submit(&chunk).await {
                Ok(()) => outcome.submitted += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to index chunk {} of {}: {}",
                        chunk.ordinal,
                        chunk.url,
                        e
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}
