//! API Module
//!
//! HTTP handlers and routing for the market data REST API.
//!
//! # Endpoints
//! - `GET /index` - Composite index quotes
//! - `GET /chart` - Index OHLCV bars
//! - `GET /summary` - Market breadth summary
//! - `GET /sectors` - Sector indices
//! - `GET /cache/stats` - Cache and retry statistics
//! - `GET /cache/entries/:key` / `DELETE /cache/entries/:key` - Inspect or invalidate one entry
//! - `DELETE /cache` - Invalidate everything
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
