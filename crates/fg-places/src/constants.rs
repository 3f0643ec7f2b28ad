use std::time::Duration;

/// The default endpoint for the Overpass spatial query service
pub const DEFAULT_SPATIAL_SERVICE_URL: &str = "https://overpass-api.de/api/interpreter";

/// The default endpoint for reverse geocoding
pub const DEFAULT_REVERSE_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// The default endpoint format for the keyword image service
pub const DEFAULT_KEYWORD_IMAGE_URL_FORMAT: &str = "https://loremflickr.com/320/240/$keyword";
pub const DEFAULT_KEYWORD_IMAGE_URL_REPLACE_TOKEN: &str = "$keyword";

/// The default endpoint for the media-commons image search
pub const DEFAULT_COMMONS_SEARCH_URL: &str = "https://commons.wikimedia.org/w/api.php";

/// The default primary and fallback IP-geolocation endpoints
pub const DEFAULT_IP_PRIMARY_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_IP_FALLBACK_URL: &str = "https://ipinfo.io/json";

/// Sentinel shown when no address could be resolved or assembled.
pub const ADDRESS_UNAVAILABLE: &str = "address unavailable";

/// Cuisine label used when the source element carries no cuisine tag.
pub const CUISINE_FALLBACK: &str = "Varied";

/// Range for ratings synthesized when the source has no rating tag.
pub const SYNTH_RATING_MIN: f32 = 3.5;
pub const SYNTH_RATING_MAX: f32 = 5.0;

/// Minimum spacing between image request issues through one resolver.
pub const IMAGE_REQUEST_SPACING: Duration = Duration::from_millis(300);

/// User-Agent sent on every request; the public Overpass and Nominatim
/// instances reject anonymous clients.
pub const USER_AGENT: &str = concat!("forage/", env!("CARGO_PKG_VERSION"));

/// Request timeouts applied by the default HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
