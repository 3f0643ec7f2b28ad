use serde::Deserialize;

/// Raw response shared by the IP-geolocation providers. Both endpoints
/// answer with this shape; `organization` is accepted as an alias for
/// providers that spell the field out.
#[derive(Deserialize)]
pub struct Response {
    pub ip: String,
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(alias = "organization")]
    pub org: Option<String>,
}
