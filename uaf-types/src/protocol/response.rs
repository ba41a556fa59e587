use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::encoding;

use super::{DisplayPngCharacteristics, Extension, OperationHeader};

/// The only assertion scheme this crate can parse.
pub const ASSERTION_SCHEME: &str = "UAFV1TLV";

/// A response sent by the client for a Reg or Auth request.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UafResponse {
    /// Operation header, echoing the request.
    pub header: OperationHeader,
    /// `base64url` encoded JSON [`FinalChallengeParams`]. Kept as received since the assertion
    /// signs a hash of this exact string.
    pub fc_params: String,
    /// Authenticator responses. Exactly one is accepted.
    pub assertions: Vec<AssertionEntry>,
}

/// One authenticator's response.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionEntry {
    /// `base64url` encoded assertion in [`AssertionEntry::assertion_scheme`] format.
    pub assertion: String,
    /// Format of the assertion.
    pub assertion_scheme: String,
    /// Display characteristics reported by the authenticator.
    #[serde(
        rename = "tcDisplayPNGCharacteristics",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tc_display_png_characteristics: Option<Vec<DisplayPngCharacteristics>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exts: Option<Vec<Extension>>,
}

/// The parameters a client binds into the assertion.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalChallengeParams {
    /// Application identifier the client used.
    #[serde(rename = "appID")]
    pub app_id: String,
    /// The challenge from the request.
    pub challenge: String,
    /// Identity of the calling application.
    #[serde(rename = "facetID")]
    pub facet_id: String,
}

impl FinalChallengeParams {
    /// The JSON serialization encoded as unpadded `base64url`, the form in which clients send it.
    pub fn to_base64url(&self) -> Result<String, serde_json::Error> {
        serde_json::to_vec(self).map(|json| encoding::base64url(&json))
    }
}
