use std::collections::HashMap;

use serde::Deserialize;

/// Raw media-commons search response.
#[derive(Deserialize)]
pub struct Response {
    pub query: Option<Query>,
}

#[derive(Deserialize)]
pub struct Query {
    #[serde(default)]
    pub pages: HashMap<String, Page>,
}

#[derive(Deserialize)]
pub struct Page {
    pub imageinfo: Option<Vec<ImageInfo>>,
}

#[derive(Deserialize)]
pub struct ImageInfo {
    pub url: Option<String>,
}
