//! API Module
//!
//! HTTP handlers and routing exposing the herd cache.
//!
//! # Endpoints
//! - `PUT /set`, `PUT /add` - Store a value
//! - `GET /get/:key` - Retrieve a value by key
//! - `POST /get_many`, `PUT /set_many` - Batch read and write
//! - `DELETE /del/:key` - Delete a key
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
