//! HTTP client for the indexing service (`POST /add`, `POST /search`).

use crate::indexer::{HitDocument, IndexSink, IndexedDocument, SearchHit};
use crate::IndexError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpIndexClient {
    client: Client,
    base_url: String,
}

impl HttpIndexClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    k: usize,
}

async fn check_status(resp: Response) -> Result<Response, IndexError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(IndexError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl IndexSink for HttpIndexClient {
    async fn add(&self, document: &IndexedDocument) -> Result<(), IndexError> {
        let resp = self
            .client
            .post(self.endpoint("add"))
            .json(document)
            .send()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;

        // The response body carries no contract beyond the status
        check_status(resp).await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let resp = self
            .client
            .post(self.endpoint("search"))
            .json(&SearchRequest { vector, k })
            .send()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;

        let pairs: Vec<(HitDocument, f32)> = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| IndexError::Decode(e.to_string()))?;

        Ok(pairs
            .into_iter()
            .map(|(document, score)| SearchHit { document, score })
            .collect())
    }
}
