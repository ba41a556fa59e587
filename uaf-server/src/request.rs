//! Builders for the three request messages.
//!
//! The builders are pure: they take the already loaded policy and authenticator records and
//! return the request. Persisting the challenge is the caller's job.

use uaf_types::{
    encoding,
    protocol::{
        AuthenticationRequest, DeregisterAuthenticator, DeregistrationRequest, MatchCriteria,
        Operation, OperationHeader, Policy, RegistrationRequest, Transaction,
    },
    record::StoredAuthenticator,
    Aaid,
};

use crate::{ServerConfig, UafError};

/// Content type of plain text transactions.
pub const TEXT_PLAIN: &str = "text/plain";

/// Which credentials a deregistration removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeregistrationTarget {
    /// Every credential of the user, announced with a wildcard entry.
    All,
    /// Every credential of the user on authenticators of one model.
    Aaid(Aaid),
    /// Every credential of the user, announced one by one.
    Known,
}

impl DeregistrationTarget {
    /// Target the credentials on authenticators of the `aaid` model.
    ///
    /// Fails with [`UafError::PolicyViolation`] unless `aaid` is of the `hex4#hex4` form.
    pub fn aaid(aaid: &str) -> Result<Self, UafError> {
        aaid.parse().map(Self::Aaid).map_err(|e| {
            log::warn!("Deregistration rejected: {e}.");
            UafError::PolicyViolation(e.to_string())
        })
    }

    /// Whether the record belongs to this target.
    pub fn selects(&self, authenticator: &StoredAuthenticator) -> bool {
        match self {
            DeregistrationTarget::All | DeregistrationTarget::Known => true,
            DeregistrationTarget::Aaid(aaid) => &authenticator.record.aaid == aaid,
        }
    }
}

fn header(config: &ServerConfig, op: Operation, server_data: Option<String>) -> OperationHeader {
    OperationHeader {
        upv: config.upv,
        app_id: Some(config.app_id.clone()),
        server_data,
        ..OperationHeader::new(op)
    }
}

/// Build a registration request.
///
/// The user's registered credentials are appended to the disallowed set so that an authenticator
/// is not registered twice.
pub fn registration(
    config: &ServerConfig,
    username: &str,
    mut policy: Policy,
    known: &[StoredAuthenticator],
    challenge: String,
    server_data: String,
) -> RegistrationRequest {
    if !known.is_empty() {
        policy.disallow(known.iter().map(|authenticator| {
            MatchCriteria::for_keys(
                vec![authenticator.record.aaid.clone()],
                vec![authenticator.record.key_id.clone()],
            )
        }));
    }

    RegistrationRequest {
        header: header(config, Operation::Reg, Some(server_data)),
        challenge,
        username: username.to_owned(),
        policy,
    }
}

/// Build an authentication request.
///
/// With `known` set, the accepted set is narrowed to exactly those credentials. Without it the
/// loaded policy is sent as is, which is only allowed when no transaction is requested.
pub fn authentication(
    config: &ServerConfig,
    mut policy: Policy,
    known: Option<&[StoredAuthenticator]>,
    transaction: Option<Transaction>,
    challenge: String,
    server_data: String,
) -> Result<AuthenticationRequest, UafError> {
    match known {
        Some([]) => {
            log::warn!("Authentication rejected: the user has no registered authenticators.");
            return Err(UafError::PolicyViolation(
                "no registered authenticators".into(),
            ));
        }
        Some(known) => {
            let (aaids, key_ids) = known
                .iter()
                .map(|a| (a.record.aaid.clone(), a.record.key_id.clone()))
                .unzip();
            policy.accepted = vec![vec![MatchCriteria::for_keys(aaids, key_ids)]];
        }
        None if transaction.is_some() => {
            log::warn!("Authentication rejected: a transaction needs a username.");
            return Err(UafError::PolicyViolation(
                "a transaction requires a username".into(),
            ));
        }
        None => {}
    }

    Ok(AuthenticationRequest {
        header: header(config, Operation::Auth, Some(server_data)),
        challenge,
        transaction: transaction.map(|transaction| vec![transaction]),
        policy,
    })
}

/// Encode transaction `content` for a display showing `content_type`.
///
/// Only `text/plain` can be produced from text, other content types fail with
/// [`UafError::UnsupportedTransactionFormat`].
pub fn transaction(content_type: &str, content: &str) -> Result<Transaction, UafError> {
    if content_type != TEXT_PLAIN {
        log::warn!("Transaction content type {content_type} is not supported.");
        return Err(UafError::UnsupportedTransactionFormat(
            content_type.to_owned(),
        ));
    }
    Ok(Transaction {
        content_type: content_type.to_owned(),
        content: encoding::base64url(content.as_bytes()),
        tc_display_png_characteristics: None,
    })
}

/// Build a deregistration request for the `targeted` records.
pub fn deregistration(
    config: &ServerConfig,
    target: &DeregistrationTarget,
    targeted: &[StoredAuthenticator],
) -> DeregistrationRequest {
    let authenticators = match target {
        _ if targeted.is_empty() => Vec::new(),
        DeregistrationTarget::All => vec![DeregisterAuthenticator::all()],
        DeregistrationTarget::Aaid(aaid) => vec![DeregisterAuthenticator::all_of(aaid)],
        DeregistrationTarget::Known => targeted
            .iter()
            .map(|a| DeregisterAuthenticator::key(&a.record.aaid, a.record.key_id.clone()))
            .collect(),
    };

    DeregistrationRequest {
        header: header(config, Operation::Dereg, None),
        authenticators,
    }
}

#[cfg(test)]
mod tests {
    use uaf_types::{
        algorithm::PublicKeyEncoding,
        record::{AuthenticatorRecord, PublicKeyMaterial, RecordId},
    };

    use super::*;

    fn stored(aaid: &str, key_id: &str) -> StoredAuthenticator {
        StoredAuthenticator {
            id: RecordId::random(),
            record: AuthenticatorRecord {
                username: "alice".into(),
                aaid: aaid.parse().expect("valid aaid"),
                key_id: key_id.into(),
                public_key: PublicKeyMaterial {
                    encoding: PublicKeyEncoding::EccX962Raw,
                    key: vec![4u8; 65].into(),
                },
                signature_counter: 0,
                registration_counter: None,
                authenticator_version: 1,
                tc_display_png_characteristics: None,
                exts: None,
            },
        }
    }

    fn policy() -> Policy {
        Policy {
            accepted: vec![vec![MatchCriteria {
                aaid: Some(vec!["ABCD#0001".parse().expect("valid aaid")]),
                ..Default::default()
            }]],
            disallowed: None,
        }
    }

    #[test]
    fn registration_disallows_known_keys() {
        let known = [stored("ABCD#0001", "a2V5MQ")];
        let request = registration(
            &ServerConfig::default(),
            "alice",
            policy(),
            &known,
            "Y2hhbGxlbmdl".into(),
            "c2VydmVy".into(),
        );

        assert_eq!(request.header.op, Operation::Reg);
        assert_eq!(request.header.server_data.as_deref(), Some("c2VydmVy"));
        let disallowed = request.policy.disallowed.expect("disallowed set");
        assert_eq!(disallowed.len(), 1);
        assert_eq!(disallowed[0].key_ids, Some(vec!["a2V5MQ".to_owned()]));
        assert_eq!(request.policy.accepted, policy().accepted);
    }

    #[test]
    fn authentication_accepts_exactly_the_known_keys() {
        let known = [stored("ABCD#0001", "a2V5MQ"), stored("ABCD#0002", "a2V5Mg")];
        let request = authentication(
            &ServerConfig::default(),
            policy(),
            Some(&known),
            None,
            "Y2hhbGxlbmdl".into(),
            "c2VydmVy".into(),
        )
        .expect("built");

        let accepted = &request.policy.accepted;
        assert_eq!(accepted.len(), 1);
        assert_eq!(
            accepted[0][0].key_ids,
            Some(vec!["a2V5MQ".to_owned(), "a2V5Mg".to_owned()])
        );
        assert_eq!(accepted[0][0].aaid.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn username_less_authentication_cannot_confirm_transactions() {
        let text = transaction(TEXT_PLAIN, "Pay 10 EUR").expect("encoded");
        let result = authentication(
            &ServerConfig::default(),
            policy(),
            None,
            Some(text),
            "Y2hhbGxlbmdl".into(),
            "c2VydmVy".into(),
        );
        assert!(matches!(result, Err(UafError::PolicyViolation(_))));
    }

    #[test]
    fn transactions_are_encoded_per_content_type() {
        let text = transaction(TEXT_PLAIN, "Pay").expect("encoded");
        assert_eq!(text.content, "UGF5");
        assert_eq!(
            transaction("image/png", "Pay"),
            Err(UafError::UnsupportedTransactionFormat("image/png".into()))
        );
    }

    #[test]
    fn deregistration_targets() {
        let config = ServerConfig::default();
        let known = [stored("ABCD#0001", "a2V5MQ"), stored("ABCD#0002", "a2V5Mg")];

        let all = deregistration(&config, &DeregistrationTarget::All, &known);
        assert_eq!(all.authenticators, [DeregisterAuthenticator::all()]);
        assert_eq!(all.header.server_data, None);

        let target = DeregistrationTarget::aaid("ABCD#0002").expect("valid aaid");
        let selected: Vec<_> = known.iter().filter(|a| target.selects(a)).cloned().collect();
        let by_aaid = deregistration(&config, &target, &selected);
        assert_eq!(by_aaid.authenticators[0].aaid, "ABCD#0002");
        assert_eq!(by_aaid.authenticators[0].key_id, "");

        let each = deregistration(&config, &DeregistrationTarget::Known, &known);
        assert_eq!(each.authenticators.len(), 2);
        assert_eq!(each.authenticators[1].key_id, "a2V5Mg");

        let none = deregistration(&config, &DeregistrationTarget::All, &[]);
        assert!(none.authenticators.is_empty());
    }

    #[test]
    fn aaid_filters_are_strict() {
        for bad in ["ABCD0001", "ABCD#001", "GHIJ#0001", "ABCD#0001 "] {
            assert!(matches!(
                DeregistrationTarget::aaid(bad),
                Err(UafError::PolicyViolation(_))
            ));
        }
    }
}
