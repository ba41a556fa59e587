//! Cryptographic and binding checks of a decoded, schema-valid assertion.

use std::ops::Range;

use uaf_types::{
    algorithm::{AuthenticationMode, PublicKeyEncoding},
    assertion::{Attestation, AuthenticationAssertion, RegistrationAssertion, SignedData},
    crypto, encoding,
    metadata::MetadataStatement,
    protocol::DisplayPngCharacteristics,
    record::{AuthenticatorRecord, PublicKeyMaterial},
    Assertion,
};

use crate::UafError;

mod keys;

#[cfg(test)]
mod tests;

const PNG: &str = "image/png";

/// The final challenge inside the signed data must be the SHA-256 of `fc_params` exactly as the
/// client sent it.
pub fn check_final_challenge(assertion: &Assertion, fc_params: &str) -> Result<(), UafError> {
    if crypto::sha256_matches(fc_params.as_bytes(), assertion.final_challenge()) {
        Ok(())
    } else {
        log::warn!("Final challenge hash does not match fcParams.");
        Err(UafError::BindingMismatch("final challenge"))
    }
}

/// Cross check the assertion against the authenticator's metadata statement.
pub fn check_metadata(
    assertion: &Assertion,
    metadata: &MetadataStatement,
) -> Result<(), UafError> {
    let info = assertion.info();
    let mismatch = |check: &'static str| {
        log::warn!("Assertion failed the metadata {check} check.");
        Err(UafError::MetadataMismatch(check))
    };

    if assertion.aaid() != &metadata.aaid {
        return mismatch("aaid");
    }
    if info.authenticator_version < metadata.authenticator_version {
        return mismatch("authenticator version");
    }
    if info.signature_algorithm != metadata.authentication_algorithm {
        return mismatch("algorithm");
    }
    if let Assertion::Registration(registration) = assertion {
        if !metadata.accepts_attestation(registration.attestation.attestation_type()) {
            return mismatch("attestation type");
        }
    }
    Ok(())
}

/// An authenticator with an `image/png` transaction display must describe that display, either
/// in the response or in its metadata.
pub fn check_display(
    metadata: &MetadataStatement,
    reported: Option<&[DisplayPngCharacteristics]>,
) -> Result<(), UafError> {
    if !metadata.displays(PNG) {
        return Ok(());
    }
    let characteristics = reported.or(metadata.tc_display_png_characteristics.as_deref());
    match characteristics {
        Some(characteristics) if !characteristics.is_empty() => Ok(()),
        _ => {
            log::warn!("Authenticator has a PNG display but no display characteristics.");
            Err(UafError::MetadataMismatch("display characteristics"))
        }
    }
}

/// Verify the attestation of a registration and return the new credential's public key.
///
/// `buffer` is the raw assertion the spans inside `registration` refer to. The key encoding comes
/// from the assertion info and falls back to the metadata when the assertion omits it.
pub fn verify_registration(
    registration: &RegistrationAssertion,
    buffer: &[u8],
    metadata: &MetadataStatement,
) -> Result<PublicKeyMaterial, UafError> {
    let krd = &registration.key_registration_data;
    let code = krd
        .info
        .public_key_algorithm
        .or(metadata.public_key_alg_and_encoding)
        .ok_or(UafError::MetadataMismatch("public key encoding"))?;
    let credential_key = keys::verifying_key(code, &krd.public_key)?;

    let attestation_key = match &registration.attestation {
        Attestation::BasicFull { certificates, .. } => {
            let certificate = certificates
                .first()
                .ok_or_else(|| UafError::schema("", "full attestation without certificate"))?;
            keys::verifying_key_from_certificate(certificate)?
        }
        Attestation::BasicSurrogate { .. } => credential_key,
    };

    let signed = signed_slice(buffer, krd.span.clone())?;
    keys::verify_signature(
        krd.info.signature_algorithm,
        &attestation_key,
        signed,
        registration.attestation.signature(),
    )?;

    let encoding =
        PublicKeyEncoding::try_from(code).map_err(|_| UafError::UnsupportedAlgorithm(code))?;
    Ok(PublicKeyMaterial {
        encoding,
        key: krd.public_key.as_slice().into(),
    })
}

/// Verify an authentication signature with the stored credential key.
pub fn verify_authentication(
    authentication: &AuthenticationAssertion,
    buffer: &[u8],
    stored: &AuthenticatorRecord,
) -> Result<(), UafError> {
    let signed_data = &authentication.signed_data;
    let key = keys::verifying_key(stored.public_key.encoding.code(), &stored.public_key.key)?;
    let signed = signed_slice(buffer, signed_data.span.clone())?;
    keys::verify_signature(
        signed_data.info.signature_algorithm,
        &key,
        signed,
        &authentication.signature,
    )
}

fn signed_slice(buffer: &[u8], span: Range<usize>) -> Result<&[u8], UafError> {
    buffer.get(span).ok_or_else(|| {
        log::warn!("Signed span lies outside the assertion.");
        UafError::SignatureInvalid
    })
}

/// A stored counter of `0` means no authentication has succeeded yet and accepts any value.
/// Otherwise the asserted counter must be strictly greater.
pub fn check_counter(stored: u32, asserted: u32) -> Result<(), UafError> {
    if stored == 0 || asserted > stored {
        Ok(())
    } else {
        log::warn!("Signature counter {asserted} does not advance past {stored}.");
        Err(UafError::ReplayDetected)
    }
}

/// Bind a transaction confirmation to the content issued with the challenge.
///
/// `issued` is the `base64url` transaction content of the challenge, if any.
pub fn check_transaction(signed_data: &SignedData, issued: Option<&str>) -> Result<(), UafError> {
    let confirmed = signed_data.info.mode() == Some(AuthenticationMode::TransactionConfirmed);
    match (confirmed, issued) {
        (false, None) => Ok(()),
        (false, Some(_)) => {
            log::warn!("A transaction was issued but not confirmed.");
            Err(UafError::BindingMismatch("transaction"))
        }
        (true, None) => {
            log::warn!("A transaction was confirmed but none was issued.");
            Err(UafError::BindingMismatch("transaction"))
        }
        (true, Some(content)) => {
            let content = encoding::try_from_any_base64(content)
                .ok_or(UafError::BindingMismatch("transaction"))?;
            if crypto::sha256_matches(&content, &signed_data.transaction_content_hash) {
                Ok(())
            } else {
                log::warn!("Transaction content hash does not match.");
                Err(UafError::BindingMismatch("transaction content hash"))
            }
        }
    }
}
