//! Pinning ticket metadata to IPFS through Pinata.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::MetroConfig;
use crate::constants::{ARC3_FRAGMENT, PINATA_GATEWAY_URL};
use crate::error::{MetroError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinataCredentials {
    pub api_key: String,
    pub secret_key: String,
}

/// Where a ticket's metadata can be found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentRef {
    /// CID returned by the pinning service.
    Pinned(String),
    /// Locally derived stand-in; nothing is actually retrievable under it.
    Placeholder(String),
}

impl ContentRef {
    pub fn cid(&self) -> &str {
        match self {
            ContentRef::Pinned(cid) | ContentRef::Placeholder(cid) => cid,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ContentRef::Placeholder(_))
    }

    /// ARC-3 asset URL, `ipfs://<cid>#arc3`.
    pub fn asset_url(&self) -> String {
        format!("ipfs://{}{}", self.cid(), ARC3_FRAGMENT)
    }

    pub fn gateway_url(&self) -> String {
        format!("{}{}", PINATA_GATEWAY_URL, self.cid())
    }
}

#[async_trait]
pub trait PinningService: Send + Sync {
    /// False when the service cannot be used at all, e.g. missing keys.
    fn is_configured(&self) -> bool {
        true
    }

    /// Pin `content` under the display name `name` and return its CID.
    async fn pin_json(&self, content: &Value, name: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

pub struct PinataClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<PinataCredentials>,
}

impl PinataClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        credentials: Option<PinataCredentials>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &MetroConfig) -> Self {
        Self::new(
            client,
            config.pinata_endpoint.clone(),
            config.pinata_credentials(),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl PinningService for PinataClient {
    fn is_configured(&self) -> bool {
        self.has_credentials()
    }

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            MetroError::MetadataUploadFailed("pinning keys not configured".to_string())
        })?;

        let body = json!({
            "pinataContent": content,
            "pinataMetadata": { "name": name },
            "pinataOptions": { "cidVersion": 0 },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("pinata_api_key", &creds.api_key)
            .header("pinata_secret_api_key", &creds.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MetroError::MetadataUploadFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetroError::MetadataUploadFailed(format!(
                "pinning service returned {status}"
            )));
        }

        let pinned: PinResponse = resp
            .json()
            .await
            .map_err(|e| MetroError::MetadataUploadFailed(e.to_string()))?;
        info!("Pinned {} as {}", name, pinned.ipfs_hash);
        Ok(pinned.ipfs_hash)
    }
}
