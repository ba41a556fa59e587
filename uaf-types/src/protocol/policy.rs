use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::aaid::Aaid;

use super::Extension;

/// Describes which authenticators a relying party accepts for an operation.
///
/// `accepted` is a disjunction of conjunctions: an authenticator set is acceptable if every
/// criterion of one inner list is matched. Anything matching an entry of `disallowed` is rejected.
#[typeshare]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Acceptable combinations of authenticators.
    pub accepted: Vec<Vec<MatchCriteria>>,

    /// Authenticators that must not be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disallowed: Option<Vec<MatchCriteria>>,
}

impl Policy {
    /// Append `criteria` to the disallowed set, creating it if needed.
    pub fn disallow(&mut self, criteria: impl IntoIterator<Item = MatchCriteria>) {
        self.disallowed.get_or_insert_with(Vec::new).extend(criteria);
    }
}

/// A set of attributes an authenticator must match.
///
/// Attributes the server does not interpret are kept in [`MatchCriteria::unknown_keys`] so that a
/// stored policy is passed to clients unchanged.
#[typeshare]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCriteria {
    /// Matching AAIDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaid: Option<Vec<Aaid>>,

    /// Matching vendor IDs, the first half of an AAID.
    #[serde(rename = "vendorID", default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Vec<String>>,

    /// Matching key IDs, `base64url` encoded.
    #[serde(rename = "keyIDs", default, skip_serializing_if = "Option::is_none")]
    pub key_ids: Option<Vec<String>>,

    /// `USER_VERIFY_*` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<u32>,

    /// `KEY_PROTECTION_*` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_protection: Option<u16>,

    /// `MATCHER_PROTECTION_*` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher_protection: Option<u16>,

    /// `ATTACHMENT_HINT_*` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_hint: Option<u32>,

    /// `TRANSACTION_CONFIRMATION_DISPLAY_*` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc_display: Option<u16>,

    /// Matching `UAF_ALG_SIGN_*` codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_algorithms: Option<Vec<u16>>,

    /// Matching assertion schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion_schemes: Option<Vec<String>>,

    /// Matching `TAG_ATTESTATION_*` codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_types: Option<Vec<u16>>,

    /// Minimum authenticator version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_version: Option<u16>,

    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exts: Option<Vec<Extension>>,

    /// Other keys, kept in their original order.
    #[serde(flatten)]
    pub unknown_keys: IndexMap<String, serde_json::Value>,
}

impl MatchCriteria {
    /// Criteria matching any of `aaids` holding any of `key_ids`.
    pub fn for_keys(aaids: Vec<Aaid>, key_ids: Vec<String>) -> Self {
        Self {
            aaid: Some(aaids),
            key_ids: Some(key_ids),
            ..Default::default()
        }
    }
}
