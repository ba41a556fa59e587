//! # UAF-RS
//!
//! A collection of Rust libraries implementing the relying party side of the [FIDO UAF 1.1][uaf]
//! protocol. It is comprised of two sub-libraries:
//!
//! - `uaf-types` - type definitions, usable as [`types`], for the JSON messages, the `UAFV1TLV`
//!   binary assertions, authenticator metadata and the numeric code registries.
//! - `uaf-server` - the protocol engine, usable as [`server`], which issues requests and verifies
//!   the responses of UAF clients.
//!
//! Much of the type naming in these libraries refers directly to the terms used in the UAF
//! standards, reading the [protocol][uaf-protocol] and [registry][uaf-registry] documents will help
//! in understanding how to use them.
//!
//! ## Basic Concepts
//!
//! Every UAF operation is a round trip through a UAF client running at a trusted facet:
//!
//! RelyingParty <-> [`UafServer`](server::UafServer) <-> [`UafStore`](server::UafStore)
//!
//! - [`start_registration()`](server::UafServer::start_registration()) and
//!   [`finish_registration()`](server::UafServer::finish_registration()) bind a new key to a user.
//! - [`start_authentication()`](server::UafServer::start_authentication()) and
//!   [`finish_authentication()`](server::UafServer::finish_authentication()) prove possession of a
//!   registered key, optionally confirming a transaction.
//! - [`start_deregistration()`](server::UafServer::start_deregistration()) forgets keys and tells
//!   the client to delete them.
//!
//! Each `start_*` call persists a single use challenge, each `finish_*` call consumes it. How
//! messages travel between the relying party and the client is up to the users of these crates.
//!
//! [uaf]: https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-overview-v1.1-ps-20170202.html
//! [uaf-protocol]: https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-protocol-v1.1-ps-20170202.html
//! [uaf-registry]: https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-reg-v1.1-ps-20170202.html
//!
//! ### Example: Registering and Authenticating
//!
//! The `testing` module of `uaf-server`, behind its `testable` feature, holds a software
//! authenticator which plays the part of the UAF client below.
//!
//! ```
//! use uaf::{
//!     server::{testing::SoftAuthenticator, MemoryStore, ServerConfig, UafServer},
//!     types::{
//!         metadata::TrustedFacets,
//!         protocol::{Policy, UafRequest, Version},
//!     },
//! };
//!
//! # tokio_test::block_on(async {
//! let mut authenticator = SoftAuthenticator::new("ABCD#0001".parse().expect("valid AAID"));
//! let store = MemoryStore::new()
//!     .with_policy("policy0", Policy::default())
//!     .with_metadata(authenticator.metadata())
//!     .with_trusted_facets(
//!         "https://example.com/uaf/facets",
//!         vec![TrustedFacets {
//!             version: Version::UAF_1_1,
//!             ids: vec!["https://example.com".into()],
//!         }],
//!     );
//! let server = UafServer::new(store, ServerConfig::default())
//!     .app_id("https://example.com/uaf/facets");
//!
//! let issued = server.start_registration("alice", None).await?;
//! let UafRequest::Registration(request) = &issued.request else {
//!     panic!("registration request expected");
//! };
//! let response = authenticator.register(request, "https://example.com")?;
//! let message = serde_json::to_value([response]).expect("serializable");
//! let registered = server.respond(&message).await?;
//!
//! let issued = server.start_authentication(Some("alice"), None, None).await?;
//! let UafRequest::Authentication(request) = &issued.request else {
//!     panic!("authentication request expected");
//! };
//! let response = authenticator.authenticate(request, "https://example.com")?;
//! let message = serde_json::to_value([response]).expect("serializable");
//! let authenticated = server.respond(&message).await?;
//!
//! assert_eq!(registered.authenticator_id, authenticated.authenticator_id);
//! # Ok::<(), uaf::server::UafError>(())
//! # }).expect("round trip");
//! ```
//!
//! A runnable demonstration binary is provided in `uaf/examples/usage.rs`.

pub use uaf_server as server;
pub use uaf_types as types;
