//! Structural validation of response messages and decoded assertions.
//!
//! A [`ResponseValidator`] is built once per request from a [`ValidationContext`] naming the
//! operations and facets acceptable at that moment. The validator is immutable, so concurrent
//! requests never share or alter each other's rules.

use serde_json::Value;
use uaf_types::{
    encoding,
    protocol::{FinalChallengeParams, Operation, UafResponse},
    tlv::Node,
};

use crate::{Diagnostic, UafError};

mod json;
mod tlv;

#[cfg(test)]
mod tests;

/// Limits carried over from the protocol's message size recommendations.
pub mod limits {
    /// Maximum length of `header.serverData`.
    pub const SERVER_DATA: usize = 1536;
    /// Maximum length of `appID` and `facetID`.
    pub const APP_ID: usize = 512;
    /// Maximum length of the `base64url` assertion, a 4096 byte TLV buffer.
    pub const ASSERTION: usize = 5462;
    /// Length range of the challenge text inside `fcParams`, from 8 bytes unpadded to 64 bytes
    /// padded. The decoded length is checked against [`CHALLENGE_BYTES`].
    pub const CHALLENGE_TEXT: (usize, usize) = (11, 88);
    /// Length range of the decoded challenge.
    pub const CHALLENGE_BYTES: (usize, usize) = (8, 64);
    /// Length range of an extension ID.
    pub const EXTENSION_ID: (usize, usize) = (1, 32);
    /// Highest plausible registration counter.
    pub const REGISTRATION_COUNTER: u32 = 1_000_000;
}

/// Request time context narrowing what a response may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    /// Operations a response may carry in `header.op`.
    pub operations: Vec<Operation>,
    /// Trusted facet IDs. `facetID` must be one of these.
    pub facet_ids: Vec<String>,
    /// The server's own application identifier, accepted as `appID` next to the facet IDs.
    pub app_id: String,
}

/// An immutable rule-set validating one kind of response.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    operations: Vec<Operation>,
    app_ids: Vec<String>,
    facet_ids: Vec<String>,
}

impl ResponseValidator {
    /// Build the rules for `context`.
    pub fn new(context: ValidationContext) -> Self {
        let mut app_ids = context.facet_ids.clone();
        if !app_ids.contains(&context.app_id) {
            app_ids.push(context.app_id);
        }
        Self {
            operations: context.operations,
            app_ids,
            facet_ids: context.facet_ids,
        }
    }

    /// Validate the response envelope and convert it into its typed form.
    pub fn response(&self, value: &Value) -> Result<UafResponse, UafError> {
        let mut diagnostics = Diagnostics::default();
        json::response(self, value, &mut diagnostics);
        diagnostics.finish()?;
        serde_json::from_value(value.clone()).map_err(|e| UafError::schema("", e.to_string()))
    }

    /// Decode `fcParams` and validate the parameters inside it.
    pub fn final_challenge_params(
        &self,
        fc_params: &str,
    ) -> Result<FinalChallengeParams, UafError> {
        let decoded = encoding::try_from_any_base64(fc_params)
            .ok_or_else(|| UafError::schema("/fcParams", "must be base64url encoded"))?;
        let value: Value = serde_json::from_slice(&decoded)
            .map_err(|e| UafError::schema("/fcParams", format!("must be JSON: {e}")))?;

        let mut diagnostics = Diagnostics::default();
        json::final_challenge_params(self, &value, &mut diagnostics);
        diagnostics.finish()?;
        serde_json::from_value(value).map_err(|e| UafError::schema("/fcParams", e.to_string()))
    }

    pub(crate) fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub(crate) fn app_ids(&self) -> &[String] {
        &self.app_ids
    }

    pub(crate) fn facet_ids(&self) -> &[String] {
        &self.facet_ids
    }
}

/// Validate the structure of a decoded assertion tree.
pub fn assertion(nodes: &[Node]) -> Result<(), UafError> {
    let mut diagnostics = Diagnostics::default();
    tlv::assertion(nodes, &mut diagnostics);
    diagnostics.finish()
}

/// Collects every violation instead of stopping at the first.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(Diagnostic::new(path, message));
    }

    fn finish(self) -> Result<(), UafError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(UafError::SchemaInvalid(self.0))
        }
    }
}
