use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::time::{sleep_until, Instant};

use crate::{
    constants::{
        DEFAULT_COMMONS_SEARCH_URL, DEFAULT_KEYWORD_IMAGE_URL_FORMAT,
        DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN, IMAGE_REQUEST_SPACING,
    },
    error::GetError,
};

use crate::api_interfaces::commons;

/// One strategy for finding a representative image. Strategies are tried in
/// order; the first `Some` wins.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn fetch_candidate(
        &self,
        client: &Client,
        name: &str,
        cuisine: &str,
    ) -> Result<Option<String>, GetError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub replace_token: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum EndpointConfigError {
    #[error("the endpoint format is missing")]
    MissingEndpoint,
    #[error("the replace token is missing")]
    MissingReplaceToken,
    #[error("the replace token provided is not in the endpoint format")]
    ReplaceTokenNotInEndpoint,
}

impl Endpoint {
    pub fn try_new(
        endpoint_format: String,
        replace_token: String,
    ) -> Result<Self, EndpointConfigError> {
        if replace_token.is_empty() {
            return Err(EndpointConfigError::MissingReplaceToken);
        }
        if endpoint_format.is_empty() {
            return Err(EndpointConfigError::MissingEndpoint);
        }
        if !endpoint_format.contains(&replace_token) {
            return Err(EndpointConfigError::ReplaceTokenNotInEndpoint);
        }
        Ok(Self {
            url: endpoint_format,
            replace_token,
        })
    }

    pub fn to_url(&self, keyword: &str) -> String {
        self.url.replace(&self.replace_token, keyword)
    }
}

/// Provider A: a random-image-by-keyword service. The cuisine's primary
/// token is the search keyword; the request itself verifies the resource
/// loads, and the final (post-redirect) URL is the candidate.
pub struct KeywordImageProvider {
    endpoint: Endpoint,
}

impl KeywordImageProvider {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl Default for KeywordImageProvider {
    fn default() -> Self {
        Self::new(
            Endpoint::try_new(
                DEFAULT_KEYWORD_IMAGE_URL_FORMAT.to_string(),
                DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN.to_string(),
            )
            .expect("Invalid default endpoint config"),
        )
    }
}

#[async_trait]
impl ImageProvider for KeywordImageProvider {
    async fn fetch_candidate(
        &self,
        client: &Client,
        _name: &str,
        cuisine: &str,
    ) -> Result<Option<String>, GetError> {
        let keyword = cuisine
            .split([';', ','])
            .next()
            .unwrap_or(cuisine)
            .trim()
            .to_lowercase()
            .replace(' ', ",");
        let response = client.get(self.endpoint.to_url(&keyword)).send().await?;
        if !response.status().is_success() {
            // The service has nothing for this keyword; not a pipeline error.
            return Ok(None);
        }
        Ok(Some(response.url().to_string()))
    }
}

/// Provider B: a media-commons search keyed by `name cuisine`; the first
/// page carrying image metadata supplies the direct URL.
pub struct CommonsImageProvider {
    endpoint: String,
}

impl CommonsImageProvider {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

impl Default for CommonsImageProvider {
    fn default() -> Self {
        Self::new(DEFAULT_COMMONS_SEARCH_URL.to_string())
    }
}

#[async_trait]
impl ImageProvider for CommonsImageProvider {
    async fn fetch_candidate(
        &self,
        client: &Client,
        name: &str,
        cuisine: &str,
    ) -> Result<Option<String>, GetError> {
        let search = format!("{} {}", name, cuisine);
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("generator", "search"),
                ("gsrsearch", search.as_str()),
                ("gsrlimit", "1"),
                ("gsrnamespace", "6"),
                ("prop", "imageinfo"),
                ("iiprop", "url"),
                ("format", "json"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GetError::ResponseError(response.status()));
        }
        let body = response.text().await.map_err(GetError::ResponseBodyError)?;
        let parsed: commons::Response = serde_json::from_str(&body)?;
        let url = parsed.query.and_then(|query| {
            query
                .pages
                .into_values()
                .filter_map(|page| page.imageinfo)
                .flatten()
                .find_map(|info| info.url)
        });
        Ok(url)
    }
}

/// Best-effort image lookup with a per-resolver cache and request pacing.
///
/// The cache keys on `(name, cuisine)` and only ever stores successes, so a
/// transient outage of every provider is retried on the next call for the
/// same key. Pacing spaces out request *issues*; cache hits are free.
pub struct ImageResolver {
    providers: Vec<Box<dyn ImageProvider>>,
    cache: HashMap<(String, String), String>,
    spacing: Duration,
    last_issue: Option<Instant>,
}

impl ImageResolver {
    pub fn new(providers: Vec<Box<dyn ImageProvider>>) -> Self {
        Self {
            providers,
            cache: HashMap::new(),
            spacing: IMAGE_REQUEST_SPACING,
            last_issue: None,
        }
    }

    /// Keyword-image service first, media-commons search second.
    pub fn with_default_providers() -> Self {
        Self::new(vec![
            Box::new(KeywordImageProvider::default()),
            Box::new(CommonsImageProvider::default()),
        ])
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    /// Resolve an image URL for `(name, cuisine)`, or `None` when every
    /// provider comes up empty. Never an error.
    pub async fn resolve(&mut self, client: &Client, name: &str, cuisine: &str) -> Option<String> {
        let key = (name.to_string(), cuisine.to_string());
        if let Some(url) = self.cache.get(&key) {
            tracing::debug!(name, cuisine, "image cache hit");
            return Some(url.clone());
        }
        self.pace().await;
        for provider in &self.providers {
            match provider.fetch_candidate(client, name, cuisine).await {
                Ok(Some(url)) => {
                    self.cache.insert(key, url.clone());
                    return Some(url);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(name, error = %e, "image provider failed, trying next");
                    continue;
                }
            }
        }
        None
    }

    // Read-then-write on one instant; the resolver is owned by a single
    // task, so no further synchronization is needed.
    async fn pace(&mut self) {
        if let Some(last) = self.last_issue {
            let ready = last + self.spacing;
            if ready > Instant::now() {
                sleep_until(ready).await;
            }
        }
        self.last_issue = Some(Instant::now());
    }
}
