use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    api_interfaces::ip,
    constants::{DEFAULT_IP_FALLBACK_URL, DEFAULT_IP_PRIMARY_URL},
    error::GetError,
};

/// The caller's public IP and approximate network location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpInfo {
    pub ip: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub organization: Option<String>,
}

/// One IP-geolocation provider; tried in order, first success wins.
#[async_trait]
pub trait IpInfoProvider: Send + Sync {
    async fn fetch(&self, client: &Client) -> Result<IpInfo, GetError>;
}

/// A provider answering with the common `{ip, city, region, org}` JSON
/// shape. Both default endpoints speak it.
pub struct JsonIpProvider {
    endpoint: String,
}

impl JsonIpProvider {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl IpInfoProvider for JsonIpProvider {
    async fn fetch(&self, client: &Client) -> Result<IpInfo, GetError> {
        let response = client.get(&self.endpoint).send().await?;
        if !response.status().is_success() {
            return Err(GetError::ResponseError(response.status()));
        }
        let body = response.text().await.map_err(GetError::ResponseBodyError)?;
        let parsed: ip::Response = serde_json::from_str(&body)?;
        Ok(IpInfo {
            ip: parsed.ip,
            city: parsed.city,
            region: parsed.region,
            organization: parsed.org,
        })
    }
}

/// The default primary-then-fallback provider chain.
pub fn default_ip_providers() -> Vec<Box<dyn IpInfoProvider>> {
    vec![
        Box::new(JsonIpProvider::new(DEFAULT_IP_PRIMARY_URL.to_string())),
        Box::new(JsonIpProvider::new(DEFAULT_IP_FALLBACK_URL.to_string())),
    ]
}

/// Walk the provider chain; `None` when every provider fails. The caller
/// shows an "unavailable" sentinel in that case.
pub async fn resolve_ip_info(
    client: &Client,
    providers: &[Box<dyn IpInfoProvider>],
) -> Option<IpInfo> {
    for provider in providers {
        match provider.fetch(client).await {
            Ok(info) => return Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "ip info provider failed, trying next");
            }
        }
    }
    None
}
