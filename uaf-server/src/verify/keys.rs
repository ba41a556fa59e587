use coset::{
    iana::{self, EnumI64},
    CborSerializable, CoseKey,
};
use p256::{
    ecdsa::{signature::Verifier, Signature, VerifyingKey},
    elliptic_curve::generic_array::GenericArray,
    pkcs8::DecodePublicKey,
    EncodedPoint,
};
use uaf_types::algorithm::{PublicKeyEncoding, SignatureAlgorithm};

use crate::UafError;

/// Parse a public key in one of the encodings UAF authenticators use for P-256 keys.
pub(crate) fn verifying_key(encoding: u16, bytes: &[u8]) -> Result<VerifyingKey, UafError> {
    let invalid = |reason: &'static str| {
        log::warn!("Public key rejected: {reason}.");
        UafError::SignatureInvalid
    };

    match PublicKeyEncoding::try_from(encoding) {
        Ok(PublicKeyEncoding::EccX962Raw) => {
            VerifyingKey::from_sec1_bytes(bytes).map_err(|_| invalid("not an X9.62 point"))
        }
        Ok(PublicKeyEncoding::EccX962Der) => VerifyingKey::from_public_key_der(bytes)
            .map_err(|_| invalid("not a P-256 SubjectPublicKeyInfo")),
        Ok(PublicKeyEncoding::Cose) => {
            let key = CoseKey::from_slice(bytes).map_err(|_| invalid("not a COSE_Key"))?;
            verifying_key_from_cose_key(&key)
        }
        _ => Err(UafError::UnsupportedAlgorithm(encoding)),
    }
}

/// Extract the P-256 verifying key from an EC2 [`CoseKey`].
pub(crate) fn verifying_key_from_cose_key(key: &CoseKey) -> Result<VerifyingKey, UafError> {
    if !matches!(
        key.kty,
        coset::RegisteredLabel::Assigned(iana::KeyType::EC2)
    ) {
        return Err(UafError::UnsupportedAlgorithm(PublicKeyEncoding::Cose.code()));
    }
    if matches!(
        key.alg,
        Some(coset::RegisteredLabelWithPrivate::Assigned(alg)) if alg != iana::Algorithm::ES256
    ) {
        return Err(UafError::UnsupportedAlgorithm(PublicKeyEncoding::Cose.code()));
    }

    let (mut x, mut y) = (None, None);
    for (label, value) in &key.params {
        if let coset::Label::Int(i) = label {
            match iana::Ec2KeyParameter::from_i64(*i) {
                Some(iana::Ec2KeyParameter::Crv) => {
                    if value.as_integer() != Some(iana::EllipticCurve::P_256.to_i64().into()) {
                        return Err(UafError::UnsupportedAlgorithm(
                            PublicKeyEncoding::Cose.code(),
                        ));
                    }
                }
                Some(iana::Ec2KeyParameter::X) => {
                    if value.as_bytes().and_then(|v| x.replace(v)).is_some() {
                        log::warn!("Cose key has multiple entries for X coordinate");
                    }
                }
                Some(iana::Ec2KeyParameter::Y) => {
                    if value.as_bytes().and_then(|v| y.replace(v)).is_some() {
                        log::warn!("Cose key has multiple entries for Y coordinate");
                    }
                }
                _ => (),
            }
        }
    }
    let (Some(x), Some(y)) = (x, y) else {
        log::warn!("Cose key is missing a coordinate");
        return Err(UafError::SignatureInvalid);
    };
    if x.len() != 32 || y.len() != 32 {
        log::warn!("Cose key coordinates are not 32 bytes long");
        return Err(UafError::SignatureInvalid);
    }

    let point = EncodedPoint::from_affine_coordinates(
        GenericArray::from_slice(x.as_slice()),
        GenericArray::from_slice(y.as_slice()),
        false,
    );
    VerifyingKey::from_encoded_point(&point).map_err(|_| UafError::SignatureInvalid)
}

/// The subject public key of a DER attestation certificate.
pub(crate) fn verifying_key_from_certificate(der: &[u8]) -> Result<VerifyingKey, UafError> {
    let (_, certificate) = x509_parser::parse_x509_certificate(der).map_err(|_| {
        log::warn!("Attestation certificate could not be parsed.");
        UafError::SignatureInvalid
    })?;
    VerifyingKey::from_public_key_der(certificate.public_key().raw).map_err(|_| {
        log::warn!("Attestation certificate does not hold a P-256 key.");
        UafError::UnsupportedAlgorithm(PublicKeyEncoding::EccX962Der.code())
    })
}

/// Verify `signature` over `message` with the `UAF_ALG_SIGN` algorithm `algorithm`.
pub(crate) fn verify_signature(
    algorithm: u16,
    key: &VerifyingKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), UafError> {
    let signature = match SignatureAlgorithm::try_from(algorithm) {
        Ok(SignatureAlgorithm::Secp256r1EcdsaSha256Raw) => Signature::from_slice(signature),
        Ok(SignatureAlgorithm::Secp256r1EcdsaSha256Der) => Signature::from_der(signature),
        _ => return Err(UafError::UnsupportedAlgorithm(algorithm)),
    }
    .map_err(|_| {
        log::warn!("Signature is not a well formed ECDSA signature.");
        UafError::SignatureInvalid
    })?;

    key.verify(message, &signature).map_err(|_| {
        log::warn!("Signature verification failed.");
        UafError::SignatureInvalid
    })
}
