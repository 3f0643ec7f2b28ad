mod api_interfaces;
pub mod address;
pub mod client;
pub mod constants;
pub mod error;
pub mod geo;
pub mod image;
pub mod ipinfo;
pub mod location;
pub mod places;
pub mod util;

pub use client::{Client, EndpointConfig};
pub use geo::Coordinate;
pub use places::{Category, NearbyQuery, NearbyQueryBuilder, PlaceRecord, Places};
