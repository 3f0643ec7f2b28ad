use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::{
    constants::DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN,
    geo::Coordinate,
    image::{CommonsImageProvider, Endpoint, ImageResolver, KeywordImageProvider},
    ipinfo::{self, IpInfo, IpInfoProvider, JsonIpProvider},
    places::{NearbyQuery, Places},
    address,
};

/// Per-provider endpoint overrides; `None` means the provider's default.
#[derive(Clone, Debug, Default)]
pub struct EndpointConfig {
    pub spatial: Option<String>,
    pub geocode: Option<String>,
    /// URL format containing the `$keyword` replace token.
    pub keyword_image_format: Option<String>,
    pub commons: Option<String>,
    /// Ordered IP provider chain; empty means the default primary/fallback.
    pub ip: Vec<String>,
}

#[derive(Debug, Error)]
pub enum EndpointConfigError {
    #[error("missing replace token `{1}` in keyword image endpoint (url: {0})")]
    MissingReplaceToken(String, String),
}

impl EndpointConfig {
    pub fn validate(&self) -> Result<(), EndpointConfigError> {
        if let Some(format) = &self.keyword_image_format {
            if !format.contains(DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN) {
                return Err(EndpointConfigError::MissingReplaceToken(
                    format.clone(),
                    DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN.to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("invalid endpoint configuration: {0}")]
    InvalidEndpointConfig(#[from] EndpointConfigError),
}

/// Facade over the three resolvers, owning the HTTP client, the image
/// resolver (cache + pacing clock) and the rating RNG.
pub struct Client<R: Rng = StdRng> {
    http_client: reqwest::Client,
    endpoints: EndpointConfig,
    images: ImageResolver,
    ip_providers: Vec<Box<dyn IpInfoProvider>>,
    rng: R,
}

impl Client<StdRng> {
    pub fn new(
        http_client: reqwest::Client,
        endpoints: Option<EndpointConfig>,
    ) -> Result<Self, ClientInitError> {
        Self::with_rng(http_client, endpoints, StdRng::from_os_rng())
    }
}

impl<R: Rng> Client<R> {
    /// Construct with an explicit RNG so tests can fix the seed.
    pub fn with_rng(
        http_client: reqwest::Client,
        endpoints: Option<EndpointConfig>,
        rng: R,
    ) -> Result<Self, ClientInitError> {
        let endpoints = endpoints.unwrap_or_default();
        endpoints.validate()?;

        let keyword_provider = match &endpoints.keyword_image_format {
            Some(format) => KeywordImageProvider::new(
                // validate() guaranteed the token is present
                Endpoint::try_new(
                    format.clone(),
                    DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN.to_string(),
                )
                .expect("validated endpoint format"),
            ),
            None => KeywordImageProvider::default(),
        };
        let commons_provider = match &endpoints.commons {
            Some(url) => CommonsImageProvider::new(url.clone()),
            None => CommonsImageProvider::default(),
        };
        let images = ImageResolver::new(vec![
            Box::new(keyword_provider),
            Box::new(commons_provider),
        ]);

        let ip_providers: Vec<Box<dyn IpInfoProvider>> = if endpoints.ip.is_empty() {
            ipinfo::default_ip_providers()
        } else {
            endpoints
                .ip
                .iter()
                .map(|url| Box::new(JsonIpProvider::new(url.clone())) as Box<dyn IpInfoProvider>)
                .collect()
        };

        Ok(Self {
            http_client,
            endpoints,
            images,
            ip_providers,
            rng,
        })
    }

    /// The full nearby-places pipeline, image enrichment included.
    pub async fn find_nearby(&mut self, query: &NearbyQuery) -> Places {
        Places::find_nearby(
            query,
            &self.http_client,
            self.endpoints.spatial.as_deref(),
            Some(&mut self.images),
            &mut self.rng,
        )
        .await
    }

    pub async fn resolve_address(&self, coordinate: &Coordinate) -> String {
        address::resolve_address(
            &self.http_client,
            self.endpoints.geocode.as_deref(),
            coordinate,
        )
        .await
    }

    pub async fn ip_info(&self) -> Option<IpInfo> {
        ipinfo::resolve_ip_info(&self.http_client, &self.ip_providers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ADDRESS_UNAVAILABLE;
    use crate::places::NearbyQueryBuilder;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn validate_rejects_format_without_token() {
        let endpoints = EndpointConfig {
            keyword_image_format: Some("https://example.com/images".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            endpoints.validate(),
            Err(EndpointConfigError::MissingReplaceToken(_, _))
        ));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let endpoints = EndpointConfig {
            keyword_image_format: Some("https://example.com/images".to_string()),
            ..Default::default()
        };
        let client = Client::new(reqwest::Client::new(), Some(endpoints));
        assert!(matches!(
            client,
            Err(ClientInitError::InvalidEndpointConfig(_))
        ));
    }

    #[tokio::test]
    async fn facade_wires_the_resolvers_together() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/spatial");
                then.status(200).json_body(json!({
                    "elements": [{
                        "type": "node",
                        "id": 9,
                        "lat": -23.55,
                        "lon": -46.63,
                        "tags": {"name": "Facade Bistro", "amenity": "restaurant"}
                    }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/img/");
                then.status(200).body("fake image bytes");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ip");
                then.status(200).json_body(json!({"ip": "203.0.113.9"}));
            })
            .await;
        let endpoints = EndpointConfig {
            spatial: Some(server.url("/spatial")),
            geocode: Some(server.url("/geocode")),
            keyword_image_format: Some(server.url("/img/$keyword")),
            commons: Some(server.url("/commons")),
            ip: vec![server.url("/ip")],
        };
        let rng = rand::rngs::StdRng::seed_from_u64(11);
        let mut client = Client::with_rng(reqwest::Client::new(), Some(endpoints), rng).unwrap();

        let query = NearbyQueryBuilder::default()
            .center(Coordinate::new(-23.5505, -46.6333).unwrap())
            .build()
            .unwrap();
        let places = client.find_nearby(&query).await;
        // the geocode endpoint is not mocked; the sentinel comes back
        let address = client
            .resolve_address(&Coordinate::new(-23.5505, -46.6333).unwrap())
            .await;
        let ip = client.ip_info().await;

        assert_eq!(places.len(), 1);
        let record = places.iter().next().unwrap();
        assert_eq!(record.name, "Facade Bistro");
        assert!(record.image_url.is_some());
        assert_eq!(address, ADDRESS_UNAVAILABLE);
        assert_eq!(ip.unwrap().ip, "203.0.113.9");
    }
}
