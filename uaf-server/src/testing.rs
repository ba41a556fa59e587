//! A software UAF authenticator producing real, signed assertions.
//!
//! Only available with the `testable` feature. It lets tests and demos drive the server end to end
//! without a device: every assertion it returns verifies against the real verifier.

use coset::{iana, CborSerializable, CoseKeyBuilder};
use p256::{
    ecdsa::{signature::Signer, Signature, SigningKey},
    pkcs8::EncodePublicKey,
};
use uaf_types::{
    algorithm::{AttestationType, AuthenticationMode, PublicKeyEncoding, SignatureAlgorithm},
    crypto, encoding,
    metadata::MetadataStatement,
    protocol::{
        AssertionEntry, AuthenticationRequest, FinalChallengeParams, OperationHeader,
        RegistrationRequest, UafResponse, Version, ASSERTION_SCHEME,
    },
    rand::random_vec,
    tlv::{AssertionInfo, Counters, Node, Tag, TlvError},
    Aaid,
};

use crate::UafError;

/// DER attestation certificate shared by every [`SoftAuthenticator`] using full attestation.
pub const ATTESTATION_CERTIFICATE: &[u8] = include_bytes!("testing/attestation.der");

/// Private scalar of the key certified by [`ATTESTATION_CERTIFICATE`].
const ATTESTATION_KEY: [u8; 32] = [
    0x25, 0x3f, 0x47, 0x5e, 0x1c, 0xce, 0xa9, 0x59, 0x38, 0x47, 0x2c, 0xe2, 0xbe, 0x52, 0x98, 0x14,
    0x1a, 0xbd, 0x04, 0x49, 0xdd, 0x3c, 0x6c, 0x70, 0xfc, 0x73, 0x25, 0x4f, 0xb8, 0x59, 0xd0, 0x80,
];

/// A P-256 authenticator holding a single credential.
pub struct SoftAuthenticator {
    aaid: Aaid,
    credential: SigningKey,
    key_id: Vec<u8>,
    signature_counter: u32,
    registration_counter: u32,
    authenticator_version: u16,
    signature_algorithm: u16,
    key_encoding: u16,
    full_attestation: bool,
}

impl SoftAuthenticator {
    /// A new authenticator of model `aaid` with a fresh credential, surrogate attestation, raw
    /// signatures and raw X9.62 keys.
    pub fn new(aaid: Aaid) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            aaid,
            credential: SigningKey::random(&mut rng),
            key_id: random_vec(32),
            signature_counter: 0,
            registration_counter: 0,
            authenticator_version: 1,
            signature_algorithm: SignatureAlgorithm::Secp256r1EcdsaSha256Raw.code(),
            key_encoding: PublicKeyEncoding::EccX962Raw.code(),
            full_attestation: false,
        }
    }

    /// Builder method attesting registrations with [`ATTESTATION_CERTIFICATE`].
    pub fn with_full_attestation(mut self) -> Self {
        self.full_attestation = true;
        self
    }

    /// Builder method declaring `algorithm` in assertions. Codes other than the two P-256 ECDSA
    /// encodings are declared but still signed with raw ECDSA.
    pub fn with_signature_algorithm(mut self, algorithm: u16) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Builder method choosing how the public key is encoded at registration.
    pub fn with_key_encoding(mut self, encoding: PublicKeyEncoding) -> Self {
        self.key_encoding = encoding.code();
        self
    }

    /// Builder method setting the reported firmware version.
    pub fn with_version(mut self, version: u16) -> Self {
        self.authenticator_version = version;
        self
    }

    /// Set the signature counter. The next assertion reports `counter + 1`.
    pub fn set_counter(&mut self, counter: u32) {
        self.signature_counter = counter;
    }

    /// The authenticator's model.
    pub fn aaid(&self) -> &Aaid {
        &self.aaid
    }

    /// The credential's key ID as stored on records.
    pub fn key_id(&self) -> String {
        encoding::base64url(&self.key_id)
    }

    /// A metadata statement describing this authenticator.
    pub fn metadata(&self) -> MetadataStatement {
        let attestation = if self.full_attestation {
            AttestationType::BasicFull
        } else {
            AttestationType::BasicSurrogate
        };
        MetadataStatement {
            aaid: self.aaid.clone(),
            description: Some("Software authenticator".into()),
            authenticator_version: self.authenticator_version,
            upv: vec![Version::UAF_1_1],
            assertion_scheme: ASSERTION_SCHEME.into(),
            authentication_algorithm: self.signature_algorithm,
            public_key_alg_and_encoding: Some(self.key_encoding),
            attestation_types: vec![attestation.code()],
            tc_display: 0x0001,
            tc_display_content_type: Some("text/plain".into()),
            tc_display_png_characteristics: None,
        }
    }

    /// The final challenge parameters a client running at `facet_id` sends for `header`.
    pub fn fc_params(
        header: &OperationHeader,
        challenge: &str,
        facet_id: &str,
    ) -> Result<String, UafError> {
        FinalChallengeParams {
            app_id: header.app_id.clone().unwrap_or_else(|| facet_id.to_owned()),
            challenge: challenge.to_owned(),
            facet_id: facet_id.to_owned(),
        }
        .to_base64url()
        .map_err(|e| UafError::schema("/fcParams", e.to_string()))
    }

    /// Answer a registration request from `facet_id`.
    pub fn register(
        &mut self,
        request: &RegistrationRequest,
        facet_id: &str,
    ) -> Result<UafResponse, UafError> {
        let fc_params = Self::fc_params(&request.header, &request.challenge, facet_id)?;
        self.register_with(request, fc_params)
    }

    /// Answer a registration request, binding the given `fc_params` string.
    pub fn register_with(
        &mut self,
        request: &RegistrationRequest,
        fc_params: String,
    ) -> Result<UafResponse, UafError> {
        self.registration_counter = self.registration_counter.wrapping_add(1);
        let krd = Node::container(
            Tag::KeyRegistrationData,
            vec![
                Node::leaf(Tag::Aaid, self.aaid.as_str()),
                Node::assertion_info(AssertionInfo {
                    authenticator_version: self.authenticator_version,
                    authentication_mode: AuthenticationMode::UserVerified.code(),
                    signature_algorithm: self.signature_algorithm,
                    public_key_algorithm: Some(self.key_encoding),
                }),
                Node::leaf(Tag::FinalChallenge, crypto::sha256(fc_params.as_bytes())),
                Node::leaf(Tag::KeyId, &self.key_id),
                Node::counters(Counters {
                    signature_counter: self.signature_counter,
                    registration_counter: Some(self.registration_counter),
                }),
                Node::leaf(Tag::PubKey, self.public_key()?),
            ],
        );

        let signed = krd.to_bytes()?;
        let attestation = if self.full_attestation {
            let key = SigningKey::from_slice(&ATTESTATION_KEY)
                .map_err(|_| UafError::SignatureInvalid)?;
            Node::container(
                Tag::AttestationBasicFull,
                vec![
                    Node::leaf(Tag::Signature, self.sign(&key, &signed)),
                    Node::leaf(Tag::AttestationCert, ATTESTATION_CERTIFICATE),
                ],
            )
        } else {
            Node::container(
                Tag::AttestationBasicSurrogate,
                vec![Node::leaf(
                    Tag::Signature,
                    self.sign(&self.credential, &signed),
                )],
            )
        };

        let assertion = Node::container(Tag::RegAssertion, vec![krd, attestation]);
        Ok(response(&request.header, fc_params, &assertion)?)
    }

    /// Answer an authentication request from `facet_id`, confirming its first transaction if it
    /// carries one.
    pub fn authenticate(
        &mut self,
        request: &AuthenticationRequest,
        facet_id: &str,
    ) -> Result<UafResponse, UafError> {
        let fc_params = Self::fc_params(&request.header, &request.challenge, facet_id)?;
        self.authenticate_with(request, fc_params)
    }

    /// Answer an authentication request, binding the given `fc_params` string.
    pub fn authenticate_with(
        &mut self,
        request: &AuthenticationRequest,
        fc_params: String,
    ) -> Result<UafResponse, UafError> {
        self.signature_counter = self.signature_counter.wrapping_add(1);

        let transaction = request
            .transaction
            .as_ref()
            .and_then(|transactions| transactions.first());
        let (mode, content_hash) = match transaction {
            Some(transaction) => {
                let content = encoding::try_from_any_base64(&transaction.content)
                    .ok_or(UafError::BindingMismatch("transaction"))?;
                (
                    AuthenticationMode::TransactionConfirmed,
                    crypto::sha256(&content).to_vec(),
                )
            }
            None => (AuthenticationMode::UserVerified, Vec::new()),
        };

        let signed_data = Node::container(
            Tag::SignedData,
            vec![
                Node::leaf(Tag::Aaid, self.aaid.as_str()),
                Node::assertion_info(AssertionInfo {
                    authenticator_version: self.authenticator_version,
                    authentication_mode: mode.code(),
                    signature_algorithm: self.signature_algorithm,
                    public_key_algorithm: None,
                }),
                Node::leaf(Tag::AuthenticatorNonce, random_vec(8)),
                Node::leaf(Tag::FinalChallenge, crypto::sha256(fc_params.as_bytes())),
                Node::leaf(Tag::TransactionContentHash, content_hash),
                Node::leaf(Tag::KeyId, &self.key_id),
                Node::counters(Counters {
                    signature_counter: self.signature_counter,
                    registration_counter: None,
                }),
            ],
        );

        let signature = self.sign(&self.credential, &signed_data.to_bytes()?);
        let assertion = Node::container(
            Tag::AuthAssertion,
            vec![signed_data, Node::leaf(Tag::Signature, signature)],
        );
        Ok(response(&request.header, fc_params, &assertion)?)
    }

    fn public_key(&self) -> Result<Vec<u8>, UafError> {
        let key = self.credential.verifying_key();
        match PublicKeyEncoding::try_from(self.key_encoding) {
            Ok(PublicKeyEncoding::EccX962Der) => key
                .to_public_key_der()
                .map(|der| der.as_bytes().to_vec())
                .map_err(|_| UafError::UnsupportedAlgorithm(self.key_encoding)),
            Ok(PublicKeyEncoding::Cose) => {
                let point = key.to_encoded_point(false);
                let (Some(x), Some(y)) = (point.x(), point.y()) else {
                    return Err(UafError::UnsupportedAlgorithm(self.key_encoding));
                };
                CoseKeyBuilder::new_ec2_pub_key(
                    iana::EllipticCurve::P_256,
                    x.to_vec(),
                    y.to_vec(),
                )
                .algorithm(iana::Algorithm::ES256)
                .build()
                .to_vec()
                .map_err(|_| UafError::UnsupportedAlgorithm(self.key_encoding))
            }
            _ => Ok(key.to_encoded_point(false).as_bytes().to_vec()),
        }
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Vec<u8> {
        let signature: Signature = key.sign(data);
        if self.signature_algorithm == SignatureAlgorithm::Secp256r1EcdsaSha256Der.code() {
            signature.to_der().as_bytes().to_vec()
        } else {
            signature.to_vec()
        }
    }
}

fn response(
    header: &OperationHeader,
    fc_params: String,
    assertion: &Node,
) -> Result<UafResponse, TlvError> {
    Ok(UafResponse {
        header: header.clone(),
        fc_params,
        assertions: vec![AssertionEntry {
            assertion: encoding::base64url(&assertion.to_bytes()?),
            assertion_scheme: ASSERTION_SCHEME.into(),
            tc_display_png_characteristics: None,
            exts: None,
        }],
    })
}
