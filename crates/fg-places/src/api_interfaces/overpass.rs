use std::collections::HashMap;

use serde::Deserialize;

/// Raw spatial query response.
#[derive(Deserialize)]
pub struct Response {
    pub elements: Vec<Element>,
}

/// Raw element from the spatial service. Nodes carry `lat`/`lon` directly;
/// ways and relations carry a representative `center` instead.
#[derive(Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}
