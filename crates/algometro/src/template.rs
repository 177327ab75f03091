//! Metadata template lookup.
//!
//! A missing or malformed template is normal: the built-in default is used
//! and nothing is reported to the user.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::constants::TEMPLATE_PATH;
use crate::state::metadata::default_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateOrigin {
    Fetched,
    Default,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataTemplate {
    pub origin: TemplateOrigin,
    pub document: Map<String, Value>,
}

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// The template object, or `None` if there is no usable one.
    async fn fetch_template(&self) -> Option<Map<String, Value>>;
}

/// Fetched template if there is one, otherwise the default.
pub async fn resolve_template(source: &dyn TemplateSource) -> MetadataTemplate {
    match source.fetch_template().await {
        Some(document) => {
            info!("Loaded custom ticket metadata template");
            MetadataTemplate {
                origin: TemplateOrigin::Fetched,
                document,
            }
        }
        None => {
            info!("Using default ticket metadata template");
            MetadataTemplate {
                origin: TemplateOrigin::Default,
                document: default_template(),
            }
        }
    }
}

fn into_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Template served over HTTP, normally `<site>/AlgoMetroNft.json`.
pub struct HttpTemplateSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTemplateSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Template at the well-known path under `site`.
    pub fn for_site(client: reqwest::Client, site: &str) -> Self {
        Self::new(
            client,
            format!("{}{}", site.trim_end_matches('/'), TEMPLATE_PATH),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn fetch_template(&self) -> Option<Map<String, Value>> {
        let resp = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("Template fetch from {} failed: {}", self.url, e);
                return None;
            }
        };

        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if !resp.status().is_success() || !is_json {
            debug!("Template at {} missing or not JSON ({})", self.url, resp.status());
            return None;
        }

        resp.json::<Value>().await.ok().and_then(into_object)
    }
}

/// Template read from a local file.
pub struct FileTemplateSource {
    path: PathBuf,
}

impl FileTemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TemplateSource for FileTemplateSource {
    async fn fetch_template(&self) -> Option<Map<String, Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) => {
                debug!("Template file {} unreadable: {}", self.path.display(), e);
                return None;
            }
        };
        serde_json::from_str::<Value>(&contents)
            .ok()
            .and_then(into_object)
    }
}

/// No template configured; always resolves to the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTemplate;

#[async_trait]
impl TemplateSource for NoTemplate {
    async fn fetch_template(&self) -> Option<Map<String, Value>> {
        None
    }
}
