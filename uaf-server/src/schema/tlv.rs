use uaf_types::{
    algorithm::{AuthenticationMode, PublicKeyEncoding, SignatureAlgorithm},
    tlv::{self, Counters, LeafFields, Node, Tag},
    Aaid,
};

use super::{limits, Diagnostics};

const KRD_CHILDREN: [Tag; 6] = [
    Tag::Aaid,
    Tag::AssertionInfo,
    Tag::FinalChallenge,
    Tag::KeyId,
    Tag::Counters,
    Tag::PubKey,
];

const SIGNED_DATA_CHILDREN: [Tag; 7] = [
    Tag::Aaid,
    Tag::AssertionInfo,
    Tag::AuthenticatorNonce,
    Tag::FinalChallenge,
    Tag::TransactionContentHash,
    Tag::KeyId,
    Tag::Counters,
];

pub(super) fn assertion(nodes: &[Node], diagnostics: &mut Diagnostics) {
    match (
        tlv::find(nodes, Tag::RegAssertion),
        tlv::find(nodes, Tag::AuthAssertion),
    ) {
        (Some(reg), None) => registration(reg, diagnostics),
        (None, Some(auth)) => authentication(auth, diagnostics),
        _ => diagnostics.push(
            "",
            format!(
                "must contain exactly one of {} or {}",
                Tag::RegAssertion,
                Tag::AuthAssertion
            ),
        ),
    }
}

fn registration(node: &Node, diagnostics: &mut Diagnostics) {
    let path = format!("/{}", Tag::RegAssertion);

    if let Some(krd) = child(node, Tag::KeyRegistrationData, &path, diagnostics) {
        let path = format!("{path}/{}", Tag::KeyRegistrationData);
        children(krd, &KRD_CHILDREN, &path, diagnostics);
    }

    match (
        node.child(Tag::AttestationBasicFull),
        node.child(Tag::AttestationBasicSurrogate),
    ) {
        (Some(full), None) => {
            let path = format!("{path}/{}", Tag::AttestationBasicFull);
            children(full, &[Tag::Signature, Tag::AttestationCert], &path, diagnostics);
        }
        (None, Some(surrogate)) => {
            let path = format!("{path}/{}", Tag::AttestationBasicSurrogate);
            children(surrogate, &[Tag::Signature], &path, diagnostics);
        }
        _ => diagnostics.push(
            path,
            format!(
                "must contain exactly one of {} or {}",
                Tag::AttestationBasicFull,
                Tag::AttestationBasicSurrogate
            ),
        ),
    }
}

fn authentication(node: &Node, diagnostics: &mut Diagnostics) {
    let path = format!("/{}", Tag::AuthAssertion);

    if let Some(signed_data) = child(node, Tag::SignedData, &path, diagnostics) {
        let path = format!("{path}/{}", Tag::SignedData);
        children(signed_data, &SIGNED_DATA_CHILDREN, &path, diagnostics);
    }

    if let Some(signature) = child(node, Tag::Signature, &path, diagnostics) {
        leaf(signature, &format!("{path}/{}", Tag::Signature), diagnostics);
    }
}

fn child<'a>(
    parent: &'a Node,
    tag: Tag,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<&'a Node> {
    let node = parent.child(tag);
    if node.is_none() {
        diagnostics.push(path, format!("missing required tag {tag}"));
    }
    node
}

fn children(parent: &Node, required: &[Tag], path: &str, diagnostics: &mut Diagnostics) {
    for &tag in required {
        if let Some(node) = child(parent, tag, path, diagnostics) {
            leaf(node, &format!("{path}/{tag}"), diagnostics);
        }
    }
}

fn leaf(node: &Node, path: &str, diagnostics: &mut Diagnostics) {
    let Some(bytes) = node.bytes() else {
        diagnostics.push(path, "must not be a container");
        return;
    };

    match node.tag() {
        Some(Tag::Aaid) => {
            if let Err(e) = Aaid::from_bytes(bytes) {
                diagnostics.push(path, e.to_string());
            }
        }
        Some(Tag::AssertionInfo) => match node.fields() {
            Some(LeafFields::AssertionInfo(info)) => {
                if info.mode().is_none() {
                    diagnostics.push(
                        format!("{path}/authenticationMode"),
                        format!(
                            "{:#04x} is not one of {:?}",
                            info.authentication_mode,
                            [
                                AuthenticationMode::UserVerified,
                                AuthenticationMode::TransactionConfirmed
                            ]
                        ),
                    );
                }
                if SignatureAlgorithm::try_from(info.signature_algorithm).is_err() {
                    diagnostics.push(
                        format!("{path}/algEncSign"),
                        format!("{:#06x} is not a UAF_ALG_SIGN code", info.signature_algorithm),
                    );
                }
                if let Some(code) = info.public_key_algorithm {
                    if PublicKeyEncoding::try_from(code).is_err() {
                        diagnostics.push(
                            format!("{path}/algEncPub"),
                            format!("{code:#06x} is not a UAF_ALG_KEY code"),
                        );
                    }
                }
            }
            _ => diagnostics.push(path, format!("length {} is not 5 or 7", bytes.len())),
        },
        Some(Tag::Counters) => match node.fields() {
            Some(LeafFields::Counters(Counters {
                registration_counter: Some(counter),
                ..
            })) if *counter > limits::REGISTRATION_COUNTER => diagnostics.push(
                format!("{path}/registrationCounter"),
                format!("{counter} is greater than {}", limits::REGISTRATION_COUNTER),
            ),
            Some(LeafFields::Counters(_)) => {}
            _ => diagnostics.push(path, format!("length {} is not 4 or 8", bytes.len())),
        },
        _ => {}
    }
}
