//! Storage backends

pub mod influx;

pub use influx::InfluxDbClient;
