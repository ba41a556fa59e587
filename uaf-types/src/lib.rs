//! # UAF Types
//!
//! Rust type definitions for the FIDO UAF 1.1 protocol: the JSON request and response messages,
//! the `UAFV1TLV` binary assertion format, trust metadata and the numeric code registries.
//!
//! The [`tlv`] module decodes assertions into a tree of [`tlv::Node`]s and [`Assertion`] turns that
//! tree into a typed registration or authentication assertion.

#[macro_use]
mod utils;

pub mod aaid;
pub mod algorithm;
pub mod assertion;
pub mod metadata;
pub mod protocol;
pub mod record;
pub mod status;
pub mod tlv;

// Re-exports
pub use aaid::{Aaid, InvalidAaid};
pub use assertion::{Assertion, AssertionShapeError};
pub use status::StatusCode;
pub use utils::{
    bytes::{Bytes, NotBase64Encoded},
    crypto, encoding, rand,
    repr_enum::CodeOutOfRange,
};
