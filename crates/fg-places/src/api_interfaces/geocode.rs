use serde::Deserialize;

/// Raw reverse-geocoding response.
#[derive(Deserialize)]
pub struct Response {
    pub display_name: Option<String>,
}
