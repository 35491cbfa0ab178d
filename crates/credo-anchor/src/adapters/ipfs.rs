use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::StoreError;
use crate::traits::ContentStore;
use crate::types::ContentAddress;

/// Default IPFS HTTP API endpoint of a local daemon.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";

/// Response body of `/api/v0/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
}

/// Content store backed by the IPFS HTTP API.
///
/// Blobs are added pinned as CIDv1 so the returned address is stable for
/// identical bytes.
pub struct IpfsContentStore {
    client: Client,
    api_url: String,
}

impl IpfsContentStore {
    /// Create a client for the API at `api_url` (e.g. `http://127.0.0.1:5001`).
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.api_url, path)
    }
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        let part = Part::bytes(bytes.to_vec()).file_name("blob");
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true"), ("cid-version", "1")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("add request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "add returned {}",
                response.status()
            )));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("malformed add response: {}", e)))?;

        let address = ContentAddress::parse(&added.hash)?;
        tracing::info!(address = %address, size = bytes.len(), "blob added to IPFS");
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        let cid = match address {
            ContentAddress::Remote(cid) => cid,
            ContentAddress::Local(_) => return Err(StoreError::NotFound(address.to_string())),
        };

        let response = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", cid.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("cat request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .bytes()
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to read response: {}", e)));
        }

        // The daemon reports unresolvable paths as 500 with a JSON message.
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND || is_not_found_message(&body) {
            Err(StoreError::NotFound(address.to_string()))
        } else {
            Err(StoreError::Unavailable(format!("cat returned {}: {}", status, body.trim())))
        }
    }
}

fn is_not_found_message(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("no link named") || lower.contains("invalid path")
}
