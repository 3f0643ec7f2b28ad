use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use derive_builder::Builder;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    api_interfaces::overpass,
    constants::{ADDRESS_UNAVAILABLE, CUISINE_FALLBACK, DEFAULT_SPATIAL_SERVICE_URL,
        SYNTH_RATING_MAX, SYNTH_RATING_MIN},
    error::{GetError, LoadError, SaveError},
    geo::Coordinate,
    image::ImageResolver,
};

/// Establishment category, derived from the source `amenity` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Restaurant,
    Cafe,
    Bar,
    FastFood,
    Generic,
}

impl Category {
    fn from_tag(amenity: &str) -> Self {
        match amenity {
            "restaurant" => Category::Restaurant,
            "cafe" => Category::Cafe,
            "bar" => Category::Bar,
            "fast_food" => Category::FastFood,
            _ => Category::Generic,
        }
    }

    /// The `amenity` value used in spatial queries. `Generic` matches
    /// nothing and is skipped when building a filter.
    fn amenity_value(self) -> Option<&'static str> {
        match self {
            Category::Restaurant => Some("restaurant"),
            Category::Cafe => Some("cafe"),
            Category::Bar => Some("bar"),
            Category::FastFood => Some("fast_food"),
            Category::Generic => None,
        }
    }
}

/// A normalized nearby-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Opaque source identifier, e.g. `node/240109189`.
    pub id: String,
    pub name: String,
    pub category: Category,
    pub cuisine: String,
    pub rating: f32,
    pub address: String,
    /// True only when the source carried a street and a house number (or a
    /// full-address field). Display hint; incomplete records are kept.
    pub has_complete_address: bool,
    pub coordinate: Coordinate,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

/// Parameters for one nearby search.
#[derive(Debug, Clone, Builder)]
pub struct NearbyQuery {
    pub center: Coordinate,
    #[builder(default = "1000")]
    pub radius_m: u32,
    #[builder(default = "vec![Category::Restaurant]")]
    pub categories: Vec<Category>,
    #[builder(default = "10")]
    pub result_cap: usize,
}

/// The capped, rating-ordered result list of one nearby search.
#[derive(Debug, PartialEq, Serialize)]
pub struct Places(Vec<PlaceRecord>);

impl Places {
    /// Run the full pipeline: query the spatial service, normalize, enrich
    /// with images when a resolver is supplied, rank and cap.
    ///
    /// Provider failures are contained: any transport error, non-success
    /// status or malformed payload degrades to an empty list.
    pub async fn find_nearby(
        query: &NearbyQuery,
        client: &Client,
        endpoint: Option<&str>,
        images: Option<&mut ImageResolver>,
        rng: &mut impl Rng,
    ) -> Self {
        let spatial_query = build_spatial_query(query);
        let elements = match fetch_elements(client, endpoint, &spatial_query).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!(error = %e, "spatial query failed, returning no places");
                return Places(Vec::new());
            }
        };
        let mut records: Vec<PlaceRecord> = elements
            .into_iter()
            .filter_map(|element| normalize(element, rng))
            .collect();
        if let Some(resolver) = images {
            for record in &mut records {
                record.image_url = resolver.resolve(client, &record.name, &record.cuisine).await;
            }
        }
        // Stable sort; ties keep source order.
        records.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
        records.truncate(query.result_cap);
        Places(records)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaceRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file_contents = tokio::fs::read_to_string(path).await?;
        Ok(Self(serde_json::from_str(file_contents.as_str())?))
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        let serialized = serde_json::to_string(&self.0)?;
        tokio::fs::write(path, serialized).await?;
        Ok(())
    }
}

impl IntoIterator for Places {
    type Item = PlaceRecord;
    type IntoIter = std::vec::IntoIter<PlaceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Render the bounded spatial query: nodes plus ways/relations with a
/// representative center, over the selected amenity values.
fn build_spatial_query(query: &NearbyQuery) -> String {
    let mut values: Vec<&str> = query
        .categories
        .iter()
        .filter_map(|category| category.amenity_value())
        .collect();
    if values.is_empty() {
        // A filter of only Generic (or nothing) means no restriction was
        // expressible; search every supported amenity.
        values = vec!["restaurant", "cafe", "bar", "fast_food"];
    }
    let amenity_pattern = format!("^({})$", values.join("|"));
    let around = format!(
        "around:{},{},{}",
        query.radius_m, query.center.latitude, query.center.longitude
    );
    format!(
        "[out:json][timeout:25];(\
         node[\"amenity\"~\"{pattern}\"]({around});\
         way[\"amenity\"~\"{pattern}\"]({around});\
         relation[\"amenity\"~\"{pattern}\"]({around});\
         );out center;",
        pattern = amenity_pattern,
        around = around,
    )
}

async fn fetch_elements(
    client: &Client,
    endpoint: Option<&str>,
    spatial_query: &str,
) -> Result<Vec<overpass::Element>, GetError> {
    let response = client
        .post(endpoint.unwrap_or(DEFAULT_SPATIAL_SERVICE_URL))
        .form(&[("data", spatial_query)])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(GetError::ResponseError(response.status()));
    }
    let body = response.text().await.map_err(GetError::ResponseBodyError)?;
    let parsed: overpass::Response = serde_json::from_str(&body)?;
    Ok(parsed.elements)
}

/// Turn one raw element into a `PlaceRecord`. Elements without usable tags,
/// a name or a position are dropped.
fn normalize(element: overpass::Element, rng: &mut impl Rng) -> Option<PlaceRecord> {
    let tags = element.tags?;
    let name = tags.get("name").filter(|name| !name.is_empty())?.clone();
    let coordinate = element_coordinate(&element.lat, &element.lon, element.center.as_ref())?;
    let (address, has_complete_address) = assemble_address(&tags);
    Some(PlaceRecord {
        id: format!("{}/{}", element.element_type, element.id),
        name,
        category: tags
            .get("amenity")
            .map(|amenity| Category::from_tag(amenity))
            .unwrap_or(Category::Generic),
        cuisine: tags
            .get("cuisine")
            .cloned()
            .unwrap_or_else(|| CUISINE_FALLBACK.to_string()),
        rating: rating_for(&tags, rng),
        address,
        has_complete_address,
        coordinate,
        website: tags
            .get("website")
            .or_else(|| tags.get("contact:website"))
            .map(|url| normalize_website(url)),
        image_url: None,
    })
}

fn element_coordinate(
    lat: &Option<f64>,
    lon: &Option<f64>,
    center: Option<&overpass::Center>,
) -> Option<Coordinate> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Coordinate::new(*lat, *lon).ok(),
        _ => center.and_then(|center| Coordinate::new(center.lat, center.lon).ok()),
    }
}

/// Source ratings are used when present and in range; otherwise a
/// presentation placeholder is synthesized so absent data never breaks
/// ranking.
fn rating_for(tags: &HashMap<String, String>, rng: &mut impl Rng) -> f32 {
    tags.get("rating")
        .or_else(|| tags.get("stars"))
        .and_then(|rating| rating.parse::<f32>().ok())
        .filter(|rating| (1.0..=5.0).contains(rating))
        .unwrap_or_else(|| rng.random_range(SYNTH_RATING_MIN..=SYNTH_RATING_MAX))
}

/// Street, house number and city in preference order; a full-address tag as
/// fallback; the sentinel when nothing structured exists.
fn assemble_address(tags: &HashMap<String, String>) -> (String, bool) {
    let street = tags.get("addr:street");
    let house_number = tags.get("addr:housenumber");
    let city = tags.get("addr:city");
    let full = tags.get("addr:full");

    let complete = street.is_some() && (house_number.is_some() || full.is_some());

    let parts: Vec<&str> = [street, house_number, city]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    if !parts.is_empty() {
        return (parts.join(", "), complete);
    }
    match full {
        Some(full) => (full.clone(), complete),
        None => (ADDRESS_UNAVAILABLE.to_string(), false),
    }
}

fn normalize_website(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture_query() -> NearbyQuery {
        NearbyQueryBuilder::default()
            .center(Coordinate::new(-23.5505, -46.6333).unwrap())
            .build()
            .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn builder_applies_defaults() {
        let query = fixture_query();
        assert_eq!(query.radius_m, 1000);
        assert_eq!(query.categories, vec![Category::Restaurant]);
        assert_eq!(query.result_cap, 10);
    }

    #[test]
    fn builder_requires_a_center() {
        let query = NearbyQueryBuilder::default().build();
        assert!(query.is_err());
    }

    #[test]
    fn spatial_query_covers_selected_categories() {
        let query = NearbyQueryBuilder::default()
            .center(Coordinate::new(10.0, 20.0).unwrap())
            .radius_m(500u32)
            .categories(vec![Category::Cafe, Category::Bar])
            .build()
            .unwrap();
        let rendered = build_spatial_query(&query);
        assert!(rendered.contains("^(cafe|bar)$"));
        assert!(rendered.contains("around:500,10,20"));
        assert!(rendered.contains("out center"));
    }

    #[test]
    fn spatial_query_falls_back_to_all_amenities() {
        let query = NearbyQueryBuilder::default()
            .center(Coordinate::new(0.0, 0.0).unwrap())
            .categories(vec![Category::Generic])
            .build()
            .unwrap();
        let rendered = build_spatial_query(&query);
        assert!(rendered.contains("^(restaurant|cafe|bar|fast_food)$"));
    }

    #[tokio::test]
    async fn nameless_elements_are_dropped_and_results_are_ranked() {
        let server = MockServer::start_async().await;
        let spatial_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({
                    "elements": [
                        {
                            "type": "node",
                            "id": 1,
                            "lat": -23.55,
                            "lon": -46.63,
                            "tags": {
                                "name": "Low Star Grill",
                                "amenity": "restaurant",
                                "rating": "2.0"
                            }
                        },
                        {
                            "type": "node",
                            "id": 2,
                            "lat": -23.551,
                            "lon": -46.634
                            // no tags at all
                        },
                        {
                            "type": "way",
                            "id": 3,
                            "center": {"lat": -23.552, "lon": -46.635},
                            "tags": {
                                "name": "Top Star Cafe",
                                "amenity": "cafe",
                                "rating": "4.8",
                                "cuisine": "coffee_shop"
                            }
                        },
                        {
                            "type": "node",
                            "id": 4,
                            "lat": -23.553,
                            "lon": -46.636,
                            "tags": {"amenity": "bar"}
                            // tags but no name
                        }
                    ]
                }));
            })
            .await;
        let url = server.url("/");
        let client = reqwest::Client::new();
        let mut rng = rng();

        let places =
            Places::find_nearby(&fixture_query(), &client, Some(&url), None, &mut rng).await;

        let records: Vec<PlaceRecord> = places.into_iter().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Top Star Cafe");
        assert_eq!(records[0].category, Category::Cafe);
        assert_eq!(records[0].cuisine, "coffee_shop");
        assert_eq!(records[0].id, "way/3");
        assert_eq!(records[1].name, "Low Star Grill");
        assert!(records[0].rating >= records[1].rating);
        spatial_mock.assert();
    }

    #[tokio::test]
    async fn result_cap_is_enforced() {
        let server = MockServer::start_async().await;
        let elements: Vec<serde_json::Value> = (0..8)
            .map(|i| {
                json!({
                    "type": "node",
                    "id": i,
                    "lat": -23.55,
                    "lon": -46.63,
                    "tags": {"name": format!("Spot {}", i), "amenity": "restaurant"}
                })
            })
            .collect();
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({"elements": elements}));
            })
            .await;
        let url = server.url("/");
        let client = reqwest::Client::new();
        let query = NearbyQueryBuilder::default()
            .center(Coordinate::new(-23.5505, -46.6333).unwrap())
            .result_cap(3usize)
            .build()
            .unwrap();
        let mut rng = rng();

        let places = Places::find_nearby(&query, &client, Some(&url), None, &mut rng).await;

        assert_eq!(places.len(), 3);
        let ratings: Vec<f32> = places.iter().map(|record| record.rating).collect();
        assert!(ratings.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[tokio::test]
    async fn zero_elements_yield_an_empty_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({"elements": []}));
            })
            .await;
        let url = server.url("/");
        let client = reqwest::Client::new();
        let mut rng = rng();

        let places =
            Places::find_nearby(&fixture_query(), &client, Some(&url), None, &mut rng).await;

        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(504);
            })
            .await;
        let url = server.url("/");
        let client = reqwest::Client::new();
        let mut rng = rng();

        let places =
            Places::find_nearby(&fixture_query(), &client, Some(&url), None, &mut rng).await;

        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_degrades_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).body("<html>not json</html>");
            })
            .await;
        let url = server.url("/");
        let client = reqwest::Client::new();
        let mut rng = rng();

        let places =
            Places::find_nearby(&fixture_query(), &client, Some(&url), None, &mut rng).await;

        assert!(places.is_empty());
    }

    #[test]
    fn synthesized_ratings_stay_in_range() {
        let mut rng = rng();
        let tags = HashMap::from([("name".to_string(), "No Rating Diner".to_string())]);
        for _ in 0..200 {
            let rating = rating_for(&tags, &mut rng);
            assert!((SYNTH_RATING_MIN..=SYNTH_RATING_MAX).contains(&rating));
        }
    }

    #[test]
    fn out_of_range_source_rating_is_replaced() {
        let mut rng = rng();
        let tags = HashMap::from([("rating".to_string(), "11".to_string())]);
        let rating = rating_for(&tags, &mut rng);
        assert!((SYNTH_RATING_MIN..=SYNTH_RATING_MAX).contains(&rating));
    }

    #[test]
    fn address_assembly_prefers_structured_fields() {
        let tags = HashMap::from([
            ("addr:street".to_string(), "Rua Augusta".to_string()),
            ("addr:housenumber".to_string(), "1508".to_string()),
            ("addr:city".to_string(), "São Paulo".to_string()),
        ]);
        let (address, complete) = assemble_address(&tags);
        assert_eq!(address, "Rua Augusta, 1508, São Paulo");
        assert!(complete);
    }

    #[test]
    fn street_without_number_is_kept_but_flagged() {
        let tags = HashMap::from([("addr:street".to_string(), "Rua Augusta".to_string())]);
        let (address, complete) = assemble_address(&tags);
        assert_eq!(address, "Rua Augusta");
        assert!(!complete);
    }

    #[test]
    fn full_address_is_a_fallback() {
        let tags = HashMap::from([(
            "addr:full".to_string(),
            "Av. Paulista 900, São Paulo".to_string(),
        )]);
        let (address, complete) = assemble_address(&tags);
        assert_eq!(address, "Av. Paulista 900, São Paulo");
        assert!(!complete);
    }

    #[test]
    fn no_address_fields_yield_sentinel() {
        let (address, complete) = assemble_address(&HashMap::new());
        assert_eq!(address, ADDRESS_UNAVAILABLE);
        assert!(!complete);
    }

    #[test]
    fn website_gets_a_scheme_when_missing() {
        assert_eq!(normalize_website("example.com"), "https://example.com");
        assert_eq!(normalize_website("http://example.com"), "http://example.com");
        assert_eq!(
            normalize_website("https://example.com"),
            "https://example.com"
        );
    }

    fn fixture_record() -> PlaceRecord {
        PlaceRecord {
            id: "node/1".to_string(),
            name: "Saved Spot".to_string(),
            category: Category::Restaurant,
            cuisine: "Varied".to_string(),
            rating: 4.2,
            address: ADDRESS_UNAVAILABLE.to_string(),
            has_complete_address: false,
            coordinate: Coordinate::new(-23.5505, -46.6333).unwrap(),
            website: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let places = Places(vec![fixture_record()]);
        let temp_file = NamedTempFile::new().unwrap();

        let save_result = places.save(temp_file.path()).await;

        assert!(
            save_result.is_ok(),
            "Failed to save places: {:?}",
            save_result.unwrap_err()
        );
        let loaded = Places::load(temp_file.path()).await.unwrap();
        assert_eq!(loaded, places);
    }

    #[tokio::test]
    async fn load_invalid_file() {
        let places = Places::load("totally_nonexistent.json").await;
        assert!(places.is_err());
        assert!(matches!(places.unwrap_err(), LoadError::ReadError(_)));
    }

    #[tokio::test]
    async fn load_bad_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", json!({"not": "a place"})).unwrap();

        let places = Places::load(temp_file.path()).await;

        assert!(places.is_err());
        assert!(matches!(places.unwrap_err(), LoadError::ParseError(_)));
    }
}
