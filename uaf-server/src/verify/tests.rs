use uaf_types::{
    algorithm::SignatureAlgorithm,
    assertion::Attestation,
    protocol::{
        AuthenticationRequest, DisplayPngCharacteristics, Operation, OperationHeader, Policy,
        RegistrationRequest, UafResponse,
    },
    tlv,
};

use super::*;
use crate::testing::SoftAuthenticator;

const FACET: &str = "https://example.com";

fn header(op: Operation) -> OperationHeader {
    OperationHeader {
        app_id: Some(FACET.into()),
        server_data: Some("c2VydmVy".into()),
        ..OperationHeader::new(op)
    }
}

fn registration_request() -> RegistrationRequest {
    RegistrationRequest {
        header: header(Operation::Reg),
        challenge: "Y2hhbGxlbmdlY2hhbGxlbmdl".into(),
        username: "alice".into(),
        policy: Policy::default(),
    }
}

fn authentication_request() -> AuthenticationRequest {
    AuthenticationRequest {
        header: header(Operation::Auth),
        challenge: "Y2hhbGxlbmdlY2hhbGxlbmdl".into(),
        transaction: None,
        policy: Policy::default(),
    }
}

fn decode(response: &UafResponse) -> (Vec<u8>, Assertion) {
    let buffer = encoding::try_from_base64url(&response.assertions[0].assertion)
        .expect("base64url assertion");
    let nodes = tlv::decode(&buffer).expect("well formed TLV");
    crate::schema::assertion(&nodes).expect("schema valid");
    let assertion = Assertion::from_nodes(&nodes).expect("typed assertion");
    (buffer, assertion)
}

fn registered(authenticator: &mut SoftAuthenticator) -> AuthenticatorRecord {
    let response = authenticator
        .register(&registration_request(), FACET)
        .expect("registered");
    let (buffer, assertion) = decode(&response);
    let Assertion::Registration(registration) = &assertion else {
        panic!("expected a registration assertion");
    };
    let public_key = verify_registration(registration, &buffer, &authenticator.metadata())
        .expect("attestation verifies");
    AuthenticatorRecord {
        username: "alice".into(),
        aaid: authenticator.aaid().clone(),
        key_id: assertion.key_id_base64url(),
        public_key,
        signature_counter: 0,
        registration_counter: assertion.counters().registration_counter,
        authenticator_version: 1,
        tc_display_png_characteristics: None,
        exts: None,
    }
}

fn soft() -> SoftAuthenticator {
    SoftAuthenticator::new("ABCD#0001".parse().expect("valid aaid"))
}

#[test]
fn surrogate_registration_verifies() {
    let mut authenticator = soft();
    let record = registered(&mut authenticator);
    assert_eq!(record.public_key.encoding, PublicKeyEncoding::EccX962Raw);
    assert_eq!(record.public_key.key.len(), 65);
    assert_eq!(record.key_id, authenticator.key_id());
}

#[test]
fn full_attestation_uses_the_certificate_key() {
    let mut authenticator = soft().with_full_attestation();
    let response = authenticator
        .register(&registration_request(), FACET)
        .expect("registered");
    let (buffer, assertion) = decode(&response);
    let Assertion::Registration(registration) = &assertion else {
        panic!("expected a registration assertion");
    };
    assert!(matches!(
        registration.attestation,
        Attestation::BasicFull { .. }
    ));
    verify_registration(registration, &buffer, &authenticator.metadata())
        .expect("attestation verifies");
}

#[test]
fn every_supported_key_encoding_verifies() {
    for encoding in [
        PublicKeyEncoding::EccX962Raw,
        PublicKeyEncoding::EccX962Der,
        PublicKeyEncoding::Cose,
    ] {
        let mut authenticator = soft()
            .with_key_encoding(encoding)
            .with_signature_algorithm(SignatureAlgorithm::Secp256r1EcdsaSha256Der.code());
        let record = registered(&mut authenticator);
        assert_eq!(record.public_key.encoding, encoding);

        let response = authenticator
            .authenticate(&authentication_request(), FACET)
            .expect("authenticated");
        let (buffer, assertion) = decode(&response);
        let Assertion::Authentication(authentication) = &assertion else {
            panic!("expected an authentication assertion");
        };
        verify_authentication(authentication, &buffer, &record).expect("signature verifies");
    }
}

#[test]
fn a_foreign_key_does_not_verify() {
    let mut alice = soft();
    let record = registered(&mut alice);

    let mut mallory = soft();
    registered(&mut mallory);
    let response = mallory
        .authenticate(&authentication_request(), FACET)
        .expect("authenticated");
    let (buffer, assertion) = decode(&response);
    let Assertion::Authentication(authentication) = &assertion else {
        panic!("expected an authentication assertion");
    };
    assert_eq!(
        verify_authentication(authentication, &buffer, &record),
        Err(UafError::SignatureInvalid)
    );
}

#[test]
fn unimplemented_algorithms_are_reported() {
    let algorithm = SignatureAlgorithm::RsassaPssSha256Raw.code();
    let mut authenticator = soft().with_signature_algorithm(algorithm);
    let response = authenticator
        .register(&registration_request(), FACET)
        .expect("registered");
    let (buffer, assertion) = decode(&response);
    let Assertion::Registration(registration) = &assertion else {
        panic!("expected a registration assertion");
    };
    assert_eq!(
        verify_registration(registration, &buffer, &authenticator.metadata()),
        Err(UafError::UnsupportedAlgorithm(algorithm))
    );
}

#[test]
fn final_challenge_binds_the_exact_fc_params() {
    let mut authenticator = soft();
    let response = authenticator
        .register(&registration_request(), FACET)
        .expect("registered");
    let (_, assertion) = decode(&response);
    check_final_challenge(&assertion, &response.fc_params).expect("bound");

    let mut tampered = response.fc_params.clone();
    tampered.push('A');
    assert_eq!(
        check_final_challenge(&assertion, &tampered),
        Err(UafError::BindingMismatch("final challenge"))
    );
}

#[test]
fn metadata_cross_checks() {
    let mut authenticator = soft();
    let response = authenticator
        .register(&registration_request(), FACET)
        .expect("registered");
    let (_, assertion) = decode(&response);
    let metadata = authenticator.metadata();
    check_metadata(&assertion, &metadata).expect("matches");

    let newer = MetadataStatement {
        authenticator_version: 2,
        ..metadata.clone()
    };
    assert_eq!(
        check_metadata(&assertion, &newer),
        Err(UafError::MetadataMismatch("authenticator version"))
    );

    let other_algorithm = MetadataStatement {
        authentication_algorithm: SignatureAlgorithm::Secp256r1EcdsaSha256Der.code(),
        ..metadata.clone()
    };
    assert_eq!(
        check_metadata(&assertion, &other_algorithm),
        Err(UafError::MetadataMismatch("algorithm"))
    );

    let full_only = MetadataStatement {
        attestation_types: vec![uaf_types::algorithm::AttestationType::BasicFull.code()],
        ..metadata.clone()
    };
    assert_eq!(
        check_metadata(&assertion, &full_only),
        Err(UafError::MetadataMismatch("attestation type"))
    );

    let other_model = MetadataStatement {
        aaid: "ABCD#0002".parse().expect("valid aaid"),
        ..metadata
    };
    assert_eq!(
        check_metadata(&assertion, &other_model),
        Err(UafError::MetadataMismatch("aaid"))
    );
}

#[test]
fn png_displays_need_characteristics() {
    let png = MetadataStatement {
        tc_display_content_type: Some("image/png".into()),
        ..soft().metadata()
    };
    assert_eq!(
        check_display(&png, None),
        Err(UafError::MetadataMismatch("display characteristics"))
    );
    assert_eq!(
        check_display(&png, Some(&[])),
        Err(UafError::MetadataMismatch("display characteristics"))
    );

    let characteristics = DisplayPngCharacteristics {
        width: 320,
        height: 240,
        bit_depth: 16,
        color_type: 2,
        compression: 0,
        filter: 0,
        interlace: 0,
        plte: None,
    };
    check_display(&png, Some(&[characteristics])).expect("reported characteristics");
    check_display(&soft().metadata(), None).expect("text display");
}

#[test]
fn counters_must_advance() {
    check_counter(0, 0).expect("first use");
    check_counter(0, 17).expect("first use");
    check_counter(5, 6).expect("advanced");
    assert_eq!(check_counter(5, 5), Err(UafError::ReplayDetected));
    assert_eq!(check_counter(5, 4), Err(UafError::ReplayDetected));
}

#[test]
fn transactions_are_bound_by_hash() {
    let mut authenticator = soft();
    registered(&mut authenticator);
    let content = encoding::base64url(b"Pay 10 EUR to Bob");
    let mut request = authentication_request();
    request.transaction = Some(vec![uaf_types::protocol::Transaction {
        content_type: "text/plain".into(),
        content: content.clone(),
        tc_display_png_characteristics: None,
    }]);

    let response = authenticator
        .authenticate(&request, FACET)
        .expect("authenticated");
    let (_, assertion) = decode(&response);
    let Assertion::Authentication(authentication) = &assertion else {
        panic!("expected an authentication assertion");
    };
    let signed_data = &authentication.signed_data;

    check_transaction(signed_data, Some(&content)).expect("confirmed");
    assert_eq!(
        check_transaction(signed_data, Some(&encoding::base64url(b"Pay 1000 EUR to Eve"))),
        Err(UafError::BindingMismatch("transaction content hash"))
    );
    assert_eq!(
        check_transaction(signed_data, None),
        Err(UafError::BindingMismatch("transaction"))
    );
}

#[test]
fn issued_transactions_must_be_confirmed() {
    let mut authenticator = soft();
    registered(&mut authenticator);
    let response = authenticator
        .authenticate(&authentication_request(), FACET)
        .expect("authenticated");
    let (_, assertion) = decode(&response);
    let Assertion::Authentication(authentication) = &assertion else {
        panic!("expected an authentication assertion");
    };
    check_transaction(&authentication.signed_data, None).expect("nothing issued");
    assert_eq!(
        check_transaction(&authentication.signed_data, Some("UGF5")),
        Err(UafError::BindingMismatch("transaction"))
    );
}
