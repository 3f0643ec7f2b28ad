pub mod commons;
pub mod geocode;
pub mod ip;
pub mod overpass;
