//! HTTP surface: the ingestion route and its access records

pub mod access;
pub mod handlers;
pub mod routes;

pub use routes::create_router;
