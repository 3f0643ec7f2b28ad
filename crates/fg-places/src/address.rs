use reqwest::Client;

use crate::{
    api_interfaces::geocode,
    constants::{ADDRESS_UNAVAILABLE, DEFAULT_REVERSE_GEOCODE_URL},
    error::GetError,
    geo::Coordinate,
};

/// Reverse-geocode `coordinate` into a display address.
///
/// Never fails from the caller's perspective: any transport, status or parse
/// problem degrades to the [`ADDRESS_UNAVAILABLE`] sentinel.
pub async fn resolve_address(
    client: &Client,
    endpoint: Option<&str>,
    coordinate: &Coordinate,
) -> String {
    match try_resolve(client, endpoint, coordinate).await {
        Ok(Some(address)) => address,
        Ok(None) => ADDRESS_UNAVAILABLE.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocoding failed, using sentinel address");
            ADDRESS_UNAVAILABLE.to_string()
        }
    }
}

async fn try_resolve(
    client: &Client,
    endpoint: Option<&str>,
    coordinate: &Coordinate,
) -> Result<Option<String>, GetError> {
    let lat = coordinate.latitude.to_string();
    let lon = coordinate.longitude.to_string();
    let response = client
        .get(endpoint.unwrap_or(DEFAULT_REVERSE_GEOCODE_URL))
        .query(&[
            ("format", "jsonv2"),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
        ])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(GetError::ResponseError(response.status()));
    }
    let body = response.text().await.map_err(GetError::ResponseBodyError)?;
    let parsed: geocode::Response = serde_json::from_str(&body)?;
    Ok(parsed.display_name)
}
