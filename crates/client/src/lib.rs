//! HTTP client for the migration backend.
//!
//! Provides the signed-request capability ([`RequestSigner`]), the REST
//! wrapper around the start/status endpoints ([`MigrationApi`]), and the
//! [`MigrationBackend`] trait the panel is written against.

pub mod api;
pub mod backend;
pub mod signing;

pub use api::{MigrationApi, MigrationApiError};
pub use backend::MigrationBackend;
pub use signing::{HmacSigner, RequestSigner, SignError, SigningRequest, UnsignedRequests};
