use serde_json::json;

use super::*;

#[test]
fn registration_request_wire_shape() {
    let request = UafRequest::Registration(RegistrationRequest {
        header: OperationHeader {
            app_id: Some("https://example.com/fido/uaf/".into()),
            server_data: Some("c2VydmVy".into()),
            ..OperationHeader::new(Operation::Reg)
        },
        challenge: "Y2hhbGxlbmdl".into(),
        username: "alice".into(),
        policy: Policy {
            accepted: vec![vec![MatchCriteria {
                user_verification: Some(1023),
                ..Default::default()
            }]],
            disallowed: None,
        },
    });

    let value = serde_json::to_value(RequestEnvelope {
        uaf_request: vec![request],
    })
    .expect("serializes");

    assert_eq!(
        value,
        json!({
            "uafRequest": [{
                "header": {
                    "upv": { "major": 1, "minor": 1 },
                    "op": "Reg",
                    "appID": "https://example.com/fido/uaf/",
                    "serverData": "c2VydmVy"
                },
                "challenge": "Y2hhbGxlbmdl",
                "username": "alice",
                "policy": { "accepted": [[{ "userVerification": 1023 }]] }
            }]
        })
    );
}

#[test]
fn policy_keeps_unknown_criteria() {
    let raw = json!({
        "accepted": [[{ "aaid": ["ABCD#0001"], "keyIDs": ["a2V5"], "futureField": [1, 2] }]],
        "disallowed": [{ "vendorID": ["ABCD"] }]
    });
    let policy: Policy = serde_json::from_value(raw.clone()).expect("valid policy");
    assert_eq!(
        policy.accepted[0][0].unknown_keys.get("futureField"),
        Some(&json!([1, 2]))
    );
    assert_eq!(serde_json::to_value(&policy).expect("serializes"), raw);
}

#[test]
fn disallow_creates_the_list() {
    let mut policy = Policy::default();
    let aaid: crate::Aaid = "ABCD#0001".parse().expect("valid aaid");
    policy.disallow([MatchCriteria::for_keys(vec![aaid], vec!["a2V5".into()])]);
    assert_eq!(policy.disallowed.as_ref().map(Vec::len), Some(1));
}

#[test]
fn deregistration_wildcards() {
    let value = serde_json::to_value(DeregisterAuthenticator::all()).expect("serializes");
    assert_eq!(value, json!({ "aaid": "", "keyID": "" }));
}

#[test]
fn final_challenge_params_round_trip() {
    let params = FinalChallengeParams {
        app_id: "https://example.com/fido/uaf/".into(),
        challenge: "Y2hhbGxlbmdl".into(),
        facet_id: "https://example.com".into(),
    };
    let encoded = params.to_base64url().expect("serializes");
    let decoded = crate::encoding::try_from_base64url(&encoded).expect("base64url");
    let parsed: FinalChallengeParams = serde_json::from_slice(&decoded).expect("json");
    assert_eq!(parsed, params);
    assert!(std::str::from_utf8(&decoded)
        .expect("utf8")
        .starts_with(r#"{"appID":"#));
}

#[test]
fn response_parses_optional_fields() {
    let response: UafResponse = serde_json::from_value(json!({
        "header": {
            "upv": { "major": 1, "minor": 1 },
            "op": "Auth",
            "appID": "https://example.com/fido/uaf/",
            "serverData": "c2VydmVy"
        },
        "fcParams": "e30",
        "assertions": [{
            "assertion": "AQID",
            "assertionScheme": ASSERTION_SCHEME,
            "tcDisplayPNGCharacteristics": [{
                "width": 320, "height": 480, "bitDepth": 16, "colorType": 2,
                "compression": 0, "filter": 0, "interlace": 0,
                "plte": [{ "r": 1, "g": 2, "b": 3 }]
            }],
            "exts": [{ "id": "ext", "data": "", "fail_if_unknown": false }]
        }]
    }))
    .expect("valid response");

    assert_eq!(response.header.op, Operation::Auth);
    let entry = &response.assertions[0];
    assert_eq!(
        entry.tc_display_png_characteristics.as_ref().map(|c| c[0].width),
        Some(320)
    );
    assert_eq!(entry.exts.as_ref().map(|e| e[0].fail_if_unknown), Some(false));
}

#[test]
fn operations_have_their_wire_names() {
    assert_eq!("Dereg".parse::<Operation>(), Ok(Operation::Dereg));
    assert_eq!(Operation::Auth.to_string(), "Auth");
    assert_eq!(Version::UAF_1_1.to_string(), "1.1");
}
