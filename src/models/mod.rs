//! Request and Response models for the herd cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{GetManyRequest, SetManyRequest, SetRequest, VersionQuery};
pub use responses::{
    AddResponse, DeleteResponse, ErrorResponse, GetManyResponse, GetResponse, HealthResponse,
    SetManyResponse, SetResponse, StatsResponse,
};
