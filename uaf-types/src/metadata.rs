//! Trust reference data: authenticator metadata statements and trusted facet lists.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    aaid::Aaid,
    algorithm::AttestationType,
    protocol::{DisplayPngCharacteristics, Version, ASSERTION_SCHEME},
};

/// What the relying party knows about an authenticator model.
///
/// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-metadata-statement-v1.1-ps-20170202.html>
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatement {
    /// The model this statement describes.
    pub aaid: Aaid,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Lowest authenticator version the statement applies to.
    pub authenticator_version: u16,

    /// Protocol versions the authenticator supports.
    pub upv: Vec<Version>,

    /// Assertion scheme used by the authenticator.
    #[serde(default = "default_assertion_scheme")]
    pub assertion_scheme: String,

    /// `UAF_ALG_SIGN_*` code the authenticator signs with.
    pub authentication_algorithm: u16,

    /// `UAF_ALG_KEY_*` code of the keys the authenticator generates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_alg_and_encoding: Option<u16>,

    /// `TAG_ATTESTATION_*` codes the authenticator may use.
    pub attestation_types: Vec<u16>,

    /// `TRANSACTION_CONFIRMATION_DISPLAY_*` flags, `0` without a display.
    #[serde(default)]
    pub tc_display: u16,

    /// MIME type of transaction content the display shows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc_display_content_type: Option<String>,

    /// Supported image characteristics, for `image/png` displays.
    #[serde(
        rename = "tcDisplayPNGCharacteristics",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tc_display_png_characteristics: Option<Vec<DisplayPngCharacteristics>>,
}

fn default_assertion_scheme() -> String {
    ASSERTION_SCHEME.to_owned()
}

impl MetadataStatement {
    /// Whether the authenticator speaks `version`.
    pub fn supports(&self, version: Version) -> bool {
        self.upv.contains(&version)
    }

    /// Whether `attestation` is one of the accepted attestation types.
    pub fn accepts_attestation(&self, attestation: AttestationType) -> bool {
        self.attestation_types.contains(&attestation.code())
    }

    /// Whether the authenticator shows transaction content of `content_type`.
    pub fn displays(&self, content_type: &str) -> bool {
        self.tc_display != 0 && self.tc_display_content_type.as_deref() == Some(content_type)
    }
}

/// Facets trusted for one protocol version.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedFacets {
    /// Protocol version the list applies to.
    pub version: Version,
    /// Web origins and application facet IDs.
    pub ids: Vec<String>,
}

/// Body served at the application identifier URL.
///
/// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-appid-and-facets-v1.1-ps-20170202.html#the-appid-and-facetid-assertions>
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedFacetList {
    /// One entry per protocol version.
    pub trusted_facets: Vec<TrustedFacets>,
}

impl TrustedFacetList {
    /// The facets for `version`, falling back to the first entry.
    pub fn for_version(&self, version: Version) -> Option<&TrustedFacets> {
        self.trusted_facets
            .iter()
            .find(|facets| facets.version == version)
            .or_else(|| self.trusted_facets.first())
    }
}
