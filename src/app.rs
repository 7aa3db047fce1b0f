//! Filesystem-backed article backend served over HTTP.

pub mod server;
pub mod store;
