use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{aaid::Aaid, status::StatusCode};

use super::{DisplayPngCharacteristics, Operation, OperationHeader, Policy};

/// `RegistrationRequest`
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Operation header, `op` is [`Operation::Reg`].
    pub header: OperationHeader,
    /// Server generated challenge, `base64url` encoded.
    pub challenge: String,
    /// The user the new credential is registered for.
    pub username: String,
    /// Authenticators acceptable for the registration.
    pub policy: Policy,
}

/// `AuthenticationRequest`
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
    /// Operation header, `op` is [`Operation::Auth`].
    pub header: OperationHeader,
    /// Server generated challenge, `base64url` encoded.
    pub challenge: String,
    /// Content the user is asked to confirm, one entry per supported content type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Vec<Transaction>>,
    /// Authenticators acceptable for the authentication.
    pub policy: Policy,
}

/// `DeregistrationRequest`
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeregistrationRequest {
    /// Operation header, `op` is [`Operation::Dereg`].
    pub header: OperationHeader,
    /// The credentials to remove.
    pub authenticators: Vec<DeregisterAuthenticator>,
}

/// A credential to remove. Empty strings act as wildcards.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeregisterAuthenticator {
    /// AAID of the authenticator, or `""` for every authenticator.
    pub aaid: String,
    /// Key ID of the credential, or `""` for every credential of `aaid`.
    #[serde(rename = "keyID")]
    pub key_id: String,
}

impl DeregisterAuthenticator {
    /// Every credential on every authenticator.
    pub fn all() -> Self {
        Self {
            aaid: String::new(),
            key_id: String::new(),
        }
    }

    /// Every credential on authenticators of the `aaid` model.
    pub fn all_of(aaid: &Aaid) -> Self {
        Self {
            aaid: aaid.to_string(),
            key_id: String::new(),
        }
    }

    /// One credential.
    pub fn key(aaid: &Aaid, key_id: impl Into<String>) -> Self {
        Self {
            aaid: aaid.to_string(),
            key_id: key_id.into(),
        }
    }
}

/// Transaction content to be displayed and confirmed by the authenticator.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// MIME type of the content, `text/plain` or `image/png`.
    pub content_type: String,
    /// `base64url` encoded content.
    pub content: String,
    /// Characteristics of the image, for `image/png` content.
    #[serde(
        rename = "tcDisplayPNGCharacteristics",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tc_display_png_characteristics: Option<DisplayPngCharacteristics>,
}

/// Any request a server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UafRequest {
    /// A registration request.
    Registration(RegistrationRequest),
    /// An authentication request.
    Authentication(AuthenticationRequest),
    /// A deregistration request.
    Deregistration(DeregistrationRequest),
}

impl UafRequest {
    /// The header of the request.
    pub fn header(&self) -> &OperationHeader {
        match self {
            UafRequest::Registration(request) => &request.header,
            UafRequest::Authentication(request) => &request.header,
            UafRequest::Deregistration(request) => &request.header,
        }
    }

    /// The operation of the request.
    pub fn op(&self) -> Operation {
        self.header().op
    }

    /// The challenge, Dereg requests have none.
    pub fn challenge(&self) -> Option<&str> {
        match self {
            UafRequest::Registration(request) => Some(&request.challenge),
            UafRequest::Authentication(request) => Some(&request.challenge),
            UafRequest::Deregistration(_) => None,
        }
    }
}

/// `{ "uafRequest": [ ... ] }` as handed to a UAF client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestEnvelope {
    /// The requests. Servers send exactly one.
    #[serde(rename = "uafRequest")]
    pub uaf_request: Vec<UafRequest>,
}

/// Transport message carrying a request to the client.
///
/// `uafRequest` holds the JSON serialized request array as a string.
///
/// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-client-api-transport-v1.1-ps-20170202.html#returnuafrequest-dictionary>
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnUafRequest {
    /// Always [`StatusCode::Ok`] for issued requests.
    pub status_code: StatusCode,
    /// The serialized request array.
    pub uaf_request: String,
    /// The operation, repeated for the client's convenience.
    pub op: Operation,
    /// How long the server will accept a response.
    pub lifetime_millis: u64,
}
