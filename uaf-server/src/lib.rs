//! # UAF Server
//!
//! A FIDO UAF 1.1 server engine. [`UafServer`] issues registration, authentication and
//! deregistration requests, then verifies the client's responses: schema validation, `UAFV1TLV`
//! assertion parsing, final challenge binding, metadata cross checks, attestation and signature
//! verification and signature counter replay detection.
//!
//! Persistence is abstracted behind the [`UafStore`] trait so that the engine holds no state of its
//! own. [`MemoryStore`] is a ready to use in-memory implementation.
//!
//! ```
//! use uaf_server::{MemoryStore, ServerConfig, UafServer};
//!
//! let server = UafServer::new(MemoryStore::new(), ServerConfig::default())
//!     .app_id("https://example.com/uaf/facets");
//! assert_eq!(server.config().policy_name, "policy0");
//! ```
//!
//! With the `testable` feature, the `testing` module provides a software authenticator producing
//! signed assertions, and `MockUafStore` a mocked store.

pub mod challenge;
mod config;
mod error;
pub mod request;
pub mod schema;
mod server;
mod store;
pub mod verify;

#[cfg(any(test, feature = "testable"))]
pub mod testing;

pub use self::{
    challenge::ChallengeRecord,
    config::{ServerConfig, DEFAULT_APP_ID, DEFAULT_POLICY_NAME, DEFAULT_REQUEST_LIFETIME},
    error::{Diagnostic, StoreError, UafError},
    request::DeregistrationTarget,
    server::{Completion, IssuedRequest, UafServer},
    store::{AuthenticatorSelector, MemoryStore, UafStore, DEFAULT_CHALLENGE_TTL},
};

#[cfg(any(test, feature = "testable"))]
pub use self::store::MockUafStore;
