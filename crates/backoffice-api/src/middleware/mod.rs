//! # Middleware
//!
//! Tower layers and `from_fn` middleware shared by the router.

pub mod rate_limit;
pub mod tracing_layer;
