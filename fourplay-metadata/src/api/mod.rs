//! HTTP API handlers for fourplay-metadata

pub mod buildinfo;
pub mod health;
pub mod metadata;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use metadata::fetch_metadata;
