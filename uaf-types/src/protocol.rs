//! JSON messages exchanged between a UAF server and a UAF client.
//!
//! <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-protocol-v1.1-ps-20170202.html>

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

mod display;
mod policy;
mod request;
mod response;

pub use self::{
    display::{DisplayPngCharacteristics, RgbPaletteEntry},
    policy::{MatchCriteria, Policy},
    request::{
        AuthenticationRequest, DeregisterAuthenticator, DeregistrationRequest,
        RegistrationRequest, RequestEnvelope, ReturnUafRequest, Transaction, UafRequest,
    },
    response::{AssertionEntry, FinalChallengeParams, UafResponse, ASSERTION_SCHEME},
};

/// UAF protocol version.
#[typeshare]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl Version {
    /// The version this crate speaks.
    pub const UAF_1_1: Version = Version { major: 1, minor: 1 };
}

impl Default for Version {
    fn default() -> Self {
        Self::UAF_1_1
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The operation a message belongs to.
#[typeshare]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
)]
pub enum Operation {
    /// Registration.
    Reg,
    /// Authentication.
    Auth,
    /// Deregistration.
    Dereg,
}

/// Header shared by every request and response.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationHeader {
    /// Protocol version.
    pub upv: Version,

    /// The operation.
    pub op: Operation,

    /// The application identifier the operation is performed for.
    #[serde(rename = "appID", default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Opaque correlator set by the server and echoed back by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_data: Option<String>,

    /// Header extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exts: Option<Vec<Extension>>,
}

impl OperationHeader {
    /// A header for `op` at [`Version::UAF_1_1`] with nothing else set.
    pub fn new(op: Operation) -> Self {
        Self {
            upv: Version::UAF_1_1,
            op,
            app_id: None,
            server_data: None,
            exts: None,
        }
    }
}

/// A protocol extension.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Extension identifier, 1 to 32 characters.
    pub id: String,
    /// `base64url` encoded extension data.
    pub data: String,
    /// Whether a receiver that does not understand the extension must abort.
    pub fail_if_unknown: bool,
}

#[cfg(test)]
mod tests;
