//! Latest-snapshot publisher and the HTTP status endpoint.

pub mod publisher;
pub mod server;
