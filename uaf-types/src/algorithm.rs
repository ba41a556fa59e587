//! Registry of the numeric codes UAF uses for algorithms, modes and attestation types.
//!
//! <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-registry-v1.1-ps-20170202.html>

use crate::tlv::Tag;

repr_enum! {
    /// `UAF_ALG_SIGN_*`: signature algorithm and signature encoding.
    SignatureAlgorithm: u16 {
        /// ECDSA on secp256r1 with SHA-256, signature as raw `r | s`.
        Secp256r1EcdsaSha256Raw: 0x0001,
        /// ECDSA on secp256r1 with SHA-256, DER encoded signature.
        Secp256r1EcdsaSha256Der: 0x0002,
        /// RSASSA-PSS with SHA-256, raw signature.
        RsassaPssSha256Raw: 0x0003,
        /// RSASSA-PSS with SHA-256, DER encoded signature.
        RsassaPssSha256Der: 0x0004,
        /// ECDSA on secp256k1 with SHA-256, signature as raw `r | s`.
        Secp256k1EcdsaSha256Raw: 0x0005,
        /// ECDSA on secp256k1 with SHA-256, DER encoded signature.
        Secp256k1EcdsaSha256Der: 0x0006,
        /// Chinese SM2 elliptic curve with SM3 hashing.
        Sm2Sm3Raw: 0x0007,
        /// RSA PKCS#1 v1.5 with SHA-256, raw signature.
        RsaEmsaPkcs1Sha256Raw: 0x0008,
        /// RSA PKCS#1 v1.5 with SHA-256, DER encoded signature.
        RsaEmsaPkcs1Sha256Der: 0x0009,
    }
}

repr_enum! {
    /// `UAF_ALG_KEY_*`: public key algorithm and key encoding.
    PublicKeyEncoding: u16 {
        /// Uncompressed ANSI X9.62 point.
        EccX962Raw: 0x0100,
        /// DER encoded SubjectPublicKeyInfo of an EC key.
        EccX962Der: 0x0101,
        /// Raw RSA 2048 modulus and exponent.
        Rsa2048Raw: 0x0102,
        /// DER encoded SubjectPublicKeyInfo of an RSA 2048 key.
        Rsa2048Der: 0x0103,
        /// CBOR encoded COSE_Key.
        Cose: 0x0104,
    }
}

repr_enum! {
    /// Authentication mode byte of `TAG_ASSERTION_INFO`.
    AuthenticationMode: u8 {
        /// The user was verified.
        UserVerified: 0x01,
        /// The user was verified and confirmed a transaction displayed by the authenticator.
        TransactionConfirmed: 0x02,
    }
}

repr_enum! {
    /// `TAG_ATTESTATION_*` codes as they appear in metadata statements.
    AttestationType: u16 {
        /// Signed by an attestation key whose certificate is carried in the assertion.
        BasicFull: 0x3E07,
        /// Self attestation, signed by the new credential's private key.
        BasicSurrogate: 0x3E08,
        /// Elliptic curve direct anonymous attestation.
        Ecdaa: 0x3E09,
        /// Attestation through an anonymization CA.
        AttCa: 0x3E0A,
    }
}

impl AttestationType {
    /// The container tag carrying this attestation inside a registration assertion, for the types
    /// this crate can parse.
    pub fn tag(self) -> Option<Tag> {
        match self {
            AttestationType::BasicFull => Some(Tag::AttestationBasicFull),
            AttestationType::BasicSurrogate => Some(Tag::AttestationBasicSurrogate),
            _ => None,
        }
    }
}
