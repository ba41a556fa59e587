//! Typed view of a decoded `UAFV1TLV` assertion.
//!
//! The TLV tree tells a registration from an authentication only by which top level tag is
//! present. [`Assertion::from_nodes`] makes that choice once so that the rest of the server works
//! with an explicit [`Assertion::Registration`] or [`Assertion::Authentication`].

use std::ops::Range;

use crate::{
    aaid::Aaid,
    algorithm::AttestationType,
    encoding,
    tlv::{self, AssertionInfo, Counters, LeafFields, Node, Tag},
};

/// Why a decoded tree could not be turned into an [`Assertion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionShapeError {
    /// Neither or both of the registration and authentication tags are present.
    UnknownAssertionType,
    /// A required tag is missing under `parent`.
    MissingTag {
        /// The container that should have held the tag.
        parent: Tag,
        /// The missing tag.
        tag: Tag,
    },
    /// A fixed layout leaf did not have one of its allowed lengths.
    BadLayout(Tag),
    /// Both or neither of the full and surrogate attestation blocks are present.
    AmbiguousAttestation,
    /// The `TAG_AAID` payload is not an AAID.
    InvalidAaid,
}

impl std::fmt::Display for AssertionShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionShapeError::UnknownAssertionType => {
                f.write_str("exactly one of a registration or authentication assertion is required")
            }
            AssertionShapeError::MissingTag { parent, tag } => {
                write!(f, "{parent} is missing {tag}")
            }
            AssertionShapeError::BadLayout(tag) => write!(f, "{tag} has an invalid length"),
            AssertionShapeError::AmbiguousAttestation => {
                f.write_str("exactly one attestation block is required")
            }
            AssertionShapeError::InvalidAaid => f.write_str("TAG_AAID is not a valid AAID"),
        }
    }
}

impl std::error::Error for AssertionShapeError {}

/// A decoded assertion of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// Response to a registration request.
    Registration(RegistrationAssertion),
    /// Response to an authentication request.
    Authentication(AuthenticationAssertion),
}

/// `TAG_UAFV1_REG_ASSERTION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAssertion {
    /// The signed registration data.
    pub key_registration_data: KeyRegistrationData,
    /// Proof that the key was created by a genuine authenticator.
    pub attestation: Attestation,
    /// Extensions attached to the assertion.
    pub extensions: Vec<AssertionExtension>,
}

/// `TAG_UAFV1_KRD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRegistrationData {
    /// Model of the authenticator.
    pub aaid: Aaid,
    /// Version, mode and algorithms.
    pub info: AssertionInfo,
    /// Hash of the final challenge parameters.
    pub final_challenge: Vec<u8>,
    /// Identifier of the new credential.
    pub key_id: Vec<u8>,
    /// Counters at registration time.
    pub counters: Counters,
    /// The new credential's public key, encoded as described by
    /// [`AssertionInfo::public_key_algorithm`].
    pub public_key: Vec<u8>,
    /// Range of the whole `TAG_UAFV1_KRD` node, header included, inside the assertion buffer.
    pub span: Range<usize>,
}

/// Attestation block of a registration assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attestation {
    /// `TAG_ATTESTATION_BASIC_FULL`
    BasicFull {
        /// Signature over the key registration data by the attestation key.
        signature: Vec<u8>,
        /// DER certificates, the attestation certificate first.
        certificates: Vec<Vec<u8>>,
    },
    /// `TAG_ATTESTATION_BASIC_SURROGATE`
    BasicSurrogate {
        /// Signature over the key registration data by the new credential's key.
        signature: Vec<u8>,
    },
}

impl Attestation {
    /// The attestation type code for comparing against metadata.
    pub fn attestation_type(&self) -> AttestationType {
        match self {
            Attestation::BasicFull { .. } => AttestationType::BasicFull,
            Attestation::BasicSurrogate { .. } => AttestationType::BasicSurrogate,
        }
    }

    /// The attestation signature.
    pub fn signature(&self) -> &[u8] {
        match self {
            Attestation::BasicFull { signature, .. }
            | Attestation::BasicSurrogate { signature } => signature,
        }
    }
}

/// `TAG_UAFV1_AUTH_ASSERTION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationAssertion {
    /// The signed authentication data.
    pub signed_data: SignedData,
    /// Signature over the signed data by the credential's key.
    pub signature: Vec<u8>,
    /// Extensions attached to the assertion.
    pub extensions: Vec<AssertionExtension>,
}

/// `TAG_UAFV1_SIGNED_DATA`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedData {
    /// Model of the authenticator.
    pub aaid: Aaid,
    /// Version, mode and signature algorithm.
    pub info: AssertionInfo,
    /// Nonce generated by the authenticator.
    pub authenticator_nonce: Vec<u8>,
    /// Hash of the final challenge parameters.
    pub final_challenge: Vec<u8>,
    /// Hash of the confirmed transaction content, empty when no transaction was confirmed.
    pub transaction_content_hash: Vec<u8>,
    /// Identifier of the credential that signed.
    pub key_id: Vec<u8>,
    /// Counters at signing time.
    pub counters: Counters,
    /// Range of the whole `TAG_UAFV1_SIGNED_DATA` node, header included, inside the assertion
    /// buffer.
    pub span: Range<usize>,
}

/// `TAG_EXTENSION` or `TAG_EXTENSION_NON_CRITICAL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionExtension {
    /// Extension identifier.
    pub id: String,
    /// Extension payload.
    pub data: Vec<u8>,
    /// Whether an unknown extension must fail the operation.
    pub critical: bool,
}

impl Assertion {
    /// Select the assertion type from a decoded tree and extract its fields.
    pub fn from_nodes(nodes: &[Node]) -> Result<Self, AssertionShapeError> {
        match (
            tlv::find(nodes, Tag::RegAssertion),
            tlv::find(nodes, Tag::AuthAssertion),
        ) {
            (Some(reg), None) => RegistrationAssertion::from_node(reg).map(Self::Registration),
            (None, Some(auth)) => {
                AuthenticationAssertion::from_node(auth).map(Self::Authentication)
            }
            _ => Err(AssertionShapeError::UnknownAssertionType),
        }
    }

    /// The AAID of the asserting authenticator.
    pub fn aaid(&self) -> &Aaid {
        match self {
            Assertion::Registration(reg) => &reg.key_registration_data.aaid,
            Assertion::Authentication(auth) => &auth.signed_data.aaid,
        }
    }

    /// Version, mode and algorithms.
    pub fn info(&self) -> &AssertionInfo {
        match self {
            Assertion::Registration(reg) => &reg.key_registration_data.info,
            Assertion::Authentication(auth) => &auth.signed_data.info,
        }
    }

    /// The hash of the final challenge parameters the authenticator signed.
    pub fn final_challenge(&self) -> &[u8] {
        match self {
            Assertion::Registration(reg) => &reg.key_registration_data.final_challenge,
            Assertion::Authentication(auth) => &auth.signed_data.final_challenge,
        }
    }

    /// The credential's key ID.
    pub fn key_id(&self) -> &[u8] {
        match self {
            Assertion::Registration(reg) => &reg.key_registration_data.key_id,
            Assertion::Authentication(auth) => &auth.signed_data.key_id,
        }
    }

    /// The key ID as stored on authenticator records, unpadded `base64url`.
    pub fn key_id_base64url(&self) -> String {
        encoding::base64url(self.key_id())
    }

    /// The counters.
    pub fn counters(&self) -> &Counters {
        match self {
            Assertion::Registration(reg) => &reg.key_registration_data.counters,
            Assertion::Authentication(auth) => &auth.signed_data.counters,
        }
    }

    /// Range of the signed container inside the assertion buffer.
    pub fn signed_span(&self) -> Range<usize> {
        match self {
            Assertion::Registration(reg) => reg.key_registration_data.span.clone(),
            Assertion::Authentication(auth) => auth.signed_data.span.clone(),
        }
    }
}

fn required<'a>(
    parent: &'a Node,
    parent_tag: Tag,
    tag: Tag,
) -> Result<&'a Node, AssertionShapeError> {
    parent.child(tag).ok_or(AssertionShapeError::MissingTag {
        parent: parent_tag,
        tag,
    })
}

fn required_bytes(
    parent: &Node,
    parent_tag: Tag,
    tag: Tag,
) -> Result<Vec<u8>, AssertionShapeError> {
    required(parent, parent_tag, tag)?
        .bytes()
        .map(<[u8]>::to_vec)
        .ok_or(AssertionShapeError::BadLayout(tag))
}

fn aaid(parent: &Node, parent_tag: Tag) -> Result<Aaid, AssertionShapeError> {
    let bytes = required_bytes(parent, parent_tag, Tag::Aaid)?;
    Aaid::from_bytes(&bytes).map_err(|_| AssertionShapeError::InvalidAaid)
}

fn assertion_info(parent: &Node, parent_tag: Tag) -> Result<AssertionInfo, AssertionShapeError> {
    match required(parent, parent_tag, Tag::AssertionInfo)?.fields() {
        Some(LeafFields::AssertionInfo(info)) => Ok(*info),
        _ => Err(AssertionShapeError::BadLayout(Tag::AssertionInfo)),
    }
}

fn counters(parent: &Node, parent_tag: Tag) -> Result<Counters, AssertionShapeError> {
    match required(parent, parent_tag, Tag::Counters)?.fields() {
        Some(LeafFields::Counters(counters)) => Ok(*counters),
        _ => Err(AssertionShapeError::BadLayout(Tag::Counters)),
    }
}

fn extensions(parent: &Node) -> Vec<AssertionExtension> {
    parent
        .children_with(Tag::Extension)
        .map(|node| (node, true))
        .chain(
            parent
                .children_with(Tag::ExtensionNonCritical)
                .map(|node| (node, false)),
        )
        .map(|(node, critical)| AssertionExtension {
            id: node
                .child(Tag::ExtensionId)
                .and_then(Node::bytes)
                .map(|id| String::from_utf8_lossy(id).into_owned())
                .unwrap_or_default(),
            data: node
                .child(Tag::ExtensionData)
                .and_then(Node::bytes)
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            critical,
        })
        .collect()
}

impl RegistrationAssertion {
    fn from_node(node: &Node) -> Result<Self, AssertionShapeError> {
        let krd = required(node, Tag::RegAssertion, Tag::KeyRegistrationData)?;
        let parent = Tag::KeyRegistrationData;
        let key_registration_data = KeyRegistrationData {
            aaid: aaid(krd, parent)?,
            info: assertion_info(krd, parent)?,
            final_challenge: required_bytes(krd, parent, Tag::FinalChallenge)?,
            key_id: required_bytes(krd, parent, Tag::KeyId)?,
            counters: counters(krd, parent)?,
            public_key: required_bytes(krd, parent, Tag::PubKey)?,
            span: krd.span(),
        };

        let attestation = match (
            node.child(Tag::AttestationBasicFull),
            node.child(Tag::AttestationBasicSurrogate),
        ) {
            (Some(full), None) => {
                let certificates: Vec<Vec<u8>> = full
                    .children_with(Tag::AttestationCert)
                    .filter_map(Node::bytes)
                    .map(<[u8]>::to_vec)
                    .collect();
                if certificates.is_empty() {
                    return Err(AssertionShapeError::MissingTag {
                        parent: Tag::AttestationBasicFull,
                        tag: Tag::AttestationCert,
                    });
                }
                Attestation::BasicFull {
                    signature: required_bytes(full, Tag::AttestationBasicFull, Tag::Signature)?,
                    certificates,
                }
            }
            (None, Some(surrogate)) => Attestation::BasicSurrogate {
                signature: required_bytes(
                    surrogate,
                    Tag::AttestationBasicSurrogate,
                    Tag::Signature,
                )?,
            },
            _ => return Err(AssertionShapeError::AmbiguousAttestation),
        };

        Ok(Self {
            key_registration_data,
            attestation,
            extensions: extensions(node),
        })
    }
}

impl AuthenticationAssertion {
    fn from_node(node: &Node) -> Result<Self, AssertionShapeError> {
        let signed = required(node, Tag::AuthAssertion, Tag::SignedData)?;
        let parent = Tag::SignedData;
        let signed_data = SignedData {
            aaid: aaid(signed, parent)?,
            info: assertion_info(signed, parent)?,
            authenticator_nonce: required_bytes(signed, parent, Tag::AuthenticatorNonce)?,
            final_challenge: required_bytes(signed, parent, Tag::FinalChallenge)?,
            transaction_content_hash: required_bytes(signed, parent, Tag::TransactionContentHash)?,
            key_id: required_bytes(signed, parent, Tag::KeyId)?,
            counters: counters(signed, parent)?,
            span: signed.span(),
        };

        Ok(Self {
            signed_data,
            signature: required_bytes(node, Tag::AuthAssertion, Tag::Signature)?,
            extensions: extensions(node),
        })
    }
}
