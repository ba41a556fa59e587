use serde_json::json;
use uaf_types::{
    encoding,
    protocol::Operation,
    tlv::{AssertionInfo, Counters, Node, Tag},
};

use super::*;

const APP_ID: &str = "https://example.com/uaf/facets";
const FACET: &str = "https://example.com";

fn validator(operations: &[Operation]) -> ResponseValidator {
    ResponseValidator::new(ValidationContext {
        operations: operations.to_vec(),
        facet_ids: vec![FACET.to_owned()],
        app_id: APP_ID.to_owned(),
    })
}

fn response(op: &str) -> Value {
    json!({
        "header": {
            "upv": { "major": 1, "minor": 1 },
            "op": op,
            "appID": APP_ID,
            "serverData": "c2VydmVyLWRhdGE"
        },
        "fcParams": "e30",
        "assertions": [{
            "assertion": "AT4E",
            "assertionScheme": "UAFV1TLV"
        }]
    })
}

fn fc_params(challenge: &str, facet: &str) -> String {
    let json = json!({ "appID": APP_ID, "challenge": challenge, "facetID": facet });
    encoding::base64url(json.to_string().as_bytes())
}

fn paths(error: UafError) -> Vec<String> {
    match error {
        UafError::SchemaInvalid(diagnostics) => diagnostics.into_iter().map(|d| d.path).collect(),
        other => panic!("expected a schema error, got {other:?}"),
    }
}

#[test]
fn well_formed_response_is_typed() {
    let response = validator(&[Operation::Reg])
        .response(&response("Reg"))
        .expect("valid response");
    assert_eq!(response.header.op, Operation::Reg);
    assert_eq!(response.fc_params, "e30");
    assert_eq!(response.assertions.len(), 1);
}

#[test]
fn operation_is_narrowed_by_context() {
    let error = validator(&[Operation::Auth])
        .response(&response("Reg"))
        .expect_err("Reg is not allowed");
    assert_eq!(paths(error), ["/header/op"]);
}

#[test]
fn every_violation_is_reported() {
    let mut value = response("Reg");
    value["header"]["upv"]["minor"] = json!(0);
    value["header"]["appID"] = json!("https://attacker.example");
    value["fcParams"] = json!(42);
    value["assertions"][0]["assertionScheme"] = json!("UAFV1");

    let error = validator(&[Operation::Reg])
        .response(&value)
        .expect_err("invalid response");
    assert_eq!(
        paths(error),
        [
            "/header/upv/minor",
            "/header/appID",
            "/fcParams",
            "/assertions/0/assertionScheme"
        ]
    );
}

#[test]
fn exactly_one_assertion_is_accepted() {
    let mut value = response("Auth");
    let entry = value["assertions"][0].clone();
    value["assertions"] = json!([entry.clone(), entry]);
    let error = validator(&[Operation::Auth])
        .response(&value)
        .expect_err("two assertions");
    assert_eq!(paths(error), ["/assertions"]);
}

#[test]
fn optional_entry_fields_are_checked() {
    let mut value = response("Auth");
    value["assertions"][0]["tcDisplayPNGCharacteristics"] = json!([{
        "width": 200, "height": 100, "bitDepth": 256, "colorType": 2,
        "compression": 0, "filter": 0, "interlace": 0,
        "plte": [{ "r": 1, "g": 2, "b": 70000 }]
    }]);
    value["assertions"][0]["exts"] = json!([{ "id": "", "data": "", "fail_if_unknown": "no" }]);

    let error = validator(&[Operation::Auth])
        .response(&value)
        .expect_err("invalid optional fields");
    assert_eq!(
        paths(error),
        [
            "/assertions/0/tcDisplayPNGCharacteristics/0/bitDepth",
            "/assertions/0/tcDisplayPNGCharacteristics/0/plte/0/b",
            "/assertions/0/exts/0/id",
            "/assertions/0/exts/0/fail_if_unknown"
        ]
    );
}

fn padded(mut text: String) -> String {
    while text.len() % 4 != 0 {
        text.push('=');
    }
    text
}

#[test]
fn challenge_length_boundaries() {
    let rules = validator(&[Operation::Reg]);
    for len in [8, 64] {
        let challenge = encoding::base64url(&vec![7u8; len]);
        let params = rules
            .final_challenge_params(&fc_params(&challenge, FACET))
            .expect("length within bounds");
        assert_eq!(params.challenge, challenge);
    }
    for len in [8, 64] {
        let challenge = padded(encoding::base64url(&vec![7u8; len]));
        rules
            .final_challenge_params(&fc_params(&challenge, FACET))
            .expect("padding does not count towards the length");
    }
    for len in [7, 65] {
        let unpadded = encoding::base64url(&vec![7u8; len]);
        for challenge in [unpadded.clone(), padded(unpadded)] {
            let error = rules
                .final_challenge_params(&fc_params(&challenge, FACET))
                .expect_err("length out of bounds");
            assert_eq!(paths(error), ["/fcParams/challenge"]);
        }
    }
}

#[test]
fn facet_must_be_trusted() {
    let challenge = encoding::base64url(&[1u8; 32]);
    let error = validator(&[Operation::Auth])
        .final_challenge_params(&fc_params(&challenge, APP_ID))
        .expect_err("the appID is not a facet");
    assert_eq!(paths(error), ["/fcParams/facetID"]);
}

#[test]
fn fc_params_must_decode_to_json() {
    let error = validator(&[Operation::Auth])
        .final_challenge_params("bm90IGpzb24")
        .expect_err("not JSON");
    assert_eq!(paths(error), ["/fcParams"]);
}

fn info(mode: u8, public_key: Option<u16>) -> Node {
    Node::assertion_info(AssertionInfo {
        authenticator_version: 1,
        authentication_mode: mode,
        signature_algorithm: 0x0001,
        public_key_algorithm: public_key,
    })
}

fn registration(krd_children: Vec<Node>) -> Vec<Node> {
    vec![Node::container(
        Tag::RegAssertion,
        vec![
            Node::container(Tag::KeyRegistrationData, krd_children),
            Node::container(
                Tag::AttestationBasicSurrogate,
                vec![Node::leaf(Tag::Signature, [1u8; 64])],
            ),
        ],
    )]
}

fn krd() -> Vec<Node> {
    vec![
        Node::leaf(Tag::Aaid, b"ABCD#0001"),
        info(0x01, Some(0x0100)),
        Node::leaf(Tag::FinalChallenge, [2u8; 32]),
        Node::leaf(Tag::KeyId, [3u8; 32]),
        Node::counters(Counters {
            signature_counter: 0,
            registration_counter: Some(0),
        }),
        Node::leaf(Tag::PubKey, [4u8; 65]),
    ]
}

#[test]
fn complete_registration_tree_passes() {
    assertion(&registration(krd())).expect("valid tree");
}

#[test]
fn missing_tags_name_their_parent() {
    let mut children = krd();
    children.retain(|node| node.tag() != Some(Tag::KeyId));
    let error = assertion(&registration(children)).expect_err("no key ID");
    let UafError::SchemaInvalid(diagnostics) = error else {
        panic!("expected a schema error");
    };
    assert_eq!(
        diagnostics[0].path,
        "/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD"
    );
    assert!(diagnostics[0].message.contains("TAG_KEYID"));
}

#[test]
fn leaf_values_are_checked() {
    let mut children = krd();
    children[0] = Node::leaf(Tag::Aaid, b"ABCD-0001");
    children[1] = info(0x07, Some(0x0999));
    children[4] = Node::counters(Counters {
        signature_counter: 0,
        registration_counter: Some(limits::REGISTRATION_COUNTER + 1),
    });

    let error = assertion(&registration(children)).expect_err("bad leaves");
    assert_eq!(
        paths(error),
        [
            "/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD/TAG_AAID",
            "/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD/TAG_ASSERTION_INFO/authenticationMode",
            "/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD/TAG_ASSERTION_INFO/algEncPub",
            "/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD/TAG_COUNTERS/registrationCounter",
        ]
    );
}

#[test]
fn counters_with_undefined_length_are_rejected() {
    let mut children = krd();
    children[4] = Node::leaf(Tag::Counters, [0u8; 6]);
    let error = assertion(&registration(children)).expect_err("6 byte counters");
    assert_eq!(
        paths(error),
        ["/TAG_UAFV1_REG_ASSERTION/TAG_UAFV1_KRD/TAG_COUNTERS"]
    );
}

#[test]
fn authentication_tree_needs_a_signature() {
    let nodes = vec![Node::container(
        Tag::AuthAssertion,
        vec![Node::container(
            Tag::SignedData,
            vec![
                Node::leaf(Tag::Aaid, b"ABCD#0001"),
                info(0x01, None),
                Node::leaf(Tag::AuthenticatorNonce, [5u8; 8]),
                Node::leaf(Tag::FinalChallenge, [2u8; 32]),
                Node::leaf(Tag::TransactionContentHash, [0u8; 0]),
                Node::leaf(Tag::KeyId, [3u8; 32]),
                Node::counters(Counters {
                    signature_counter: 1,
                    registration_counter: None,
                }),
            ],
        )],
    )];
    let error = assertion(&nodes).expect_err("no signature");
    assert_eq!(paths(error), ["/TAG_UAFV1_AUTH_ASSERTION"]);
}

#[test]
fn assertion_type_must_be_unambiguous() {
    let error = assertion(&[Node::leaf(Tag::KeyId, [1u8])]).expect_err("no assertion");
    assert_eq!(paths(error), [""]);
}
