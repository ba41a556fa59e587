//! Registered credentials as the server persists them.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    aaid::Aaid,
    algorithm::PublicKeyEncoding,
    protocol::{DisplayPngCharacteristics, Extension},
    rand, Bytes,
};

/// Identifier of a stored authenticator record, 12 random bytes as lowercase hex.
#[typeshare(serialized_as = "String")]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Length of the random part, in bytes.
    pub const LEN: usize = 12;

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(rand::random_hex(Self::LEN))
    }

    /// The textual representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A public key kept in the encoding the authenticator sent it in.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyMaterial {
    /// How [`PublicKeyMaterial::key`] is encoded.
    pub encoding: PublicKeyEncoding,
    /// The encoded key.
    pub key: Bytes,
}

/// A registered credential.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorRecord {
    /// Owner of the credential.
    pub username: String,
    /// Model of the authenticator holding the credential.
    pub aaid: Aaid,
    /// Key ID, unpadded `base64url`.
    #[serde(rename = "keyID")]
    pub key_id: String,
    /// The credential's public key.
    pub public_key: PublicKeyMaterial,
    /// Last accepted signature counter.
    pub signature_counter: u32,
    /// Registration counter reported at registration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_counter: Option<u32>,
    /// Firmware version reported at registration time.
    pub authenticator_version: u16,
    /// Display characteristics reported at registration time.
    #[serde(
        rename = "tcDisplayPNGCharacteristics",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tc_display_png_characteristics: Option<Vec<DisplayPngCharacteristics>>,
    /// Extensions sent with the registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exts: Option<Vec<Extension>>,
}

/// A record together with its identifier.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuthenticator {
    /// Record identifier.
    pub id: RecordId,
    /// The record.
    #[serde(flatten)]
    pub record: AuthenticatorRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_hex() {
        let id = RecordId::random();
        assert_eq!(id.as_str().len(), RecordId::LEN * 2);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(id, RecordId::random());
    }

    #[test]
    fn stored_records_are_flat() {
        let stored = StoredAuthenticator {
            id: RecordId::from("00ff".to_owned()),
            record: AuthenticatorRecord {
                username: "alice".into(),
                aaid: "ABCD#0001".parse().expect("valid aaid"),
                key_id: "a2V5".into(),
                public_key: PublicKeyMaterial {
                    encoding: PublicKeyEncoding::EccX962Raw,
                    key: vec![4, 1, 2].into(),
                },
                signature_counter: 0,
                registration_counter: None,
                authenticator_version: 1,
                tc_display_png_characteristics: None,
                exts: None,
            },
        };
        let value = serde_json::to_value(&stored).expect("serializes");
        assert_eq!(value["id"], "00ff");
        assert_eq!(value["keyID"], "a2V5");
        assert_eq!(value["publicKey"]["encoding"], 256);
        let back: StoredAuthenticator = serde_json::from_value(value).expect("deserializes");
        assert_eq!(back, stored);
    }
}
