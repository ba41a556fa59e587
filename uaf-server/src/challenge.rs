//! Single use challenges binding a response to the request it answers.

use serde::{Deserialize, Serialize};
use uaf_types::{
    protocol::{AuthenticationRequest, Operation, Policy, RegistrationRequest},
    rand,
};

use crate::{UafError, UafStore};

/// Bytes of entropy in challenges and generated server data.
pub const CHALLENGE_LEN: usize = 32;

/// What the server remembers about an issued request until the response arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    /// The challenge, `base64url` encoded. Used as the lookup key.
    pub challenge: String,
    /// The operation the challenge was issued for.
    pub op: Operation,
    /// Correlator sent in the request header.
    pub server_data: String,
    /// The user the request was issued for, `None` for username-less authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The policy sent with the request.
    pub policy: Policy,
    /// `base64url` transaction content the user was asked to confirm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
}

impl ChallengeRecord {
    pub(crate) fn for_registration(request: &RegistrationRequest) -> Self {
        Self {
            challenge: request.challenge.clone(),
            op: Operation::Reg,
            server_data: request.header.server_data.clone().unwrap_or_default(),
            username: Some(request.username.clone()),
            policy: request.policy.clone(),
            transaction: None,
        }
    }

    pub(crate) fn for_authentication(
        request: &AuthenticationRequest,
        username: Option<&str>,
    ) -> Self {
        Self {
            challenge: request.challenge.clone(),
            op: Operation::Auth,
            server_data: request.header.server_data.clone().unwrap_or_default(),
            username: username.map(str::to_owned),
            policy: request.policy.clone(),
            transaction: request
                .transaction
                .as_ref()
                .and_then(|transactions| transactions.first())
                .map(|transaction| transaction.content.clone()),
        }
    }
}

/// A fresh random challenge.
pub fn new_challenge() -> String {
    rand::random_base64url(CHALLENGE_LEN)
}

/// Fresh random server data, used when the caller supplies no correlator.
pub fn new_server_data() -> String {
    rand::random_base64url(CHALLENGE_LEN)
}

/// Persist `record`. Expiry is the store's responsibility.
pub async fn issue<S>(store: &S, record: ChallengeRecord) -> Result<(), UafError>
where
    S: UafStore + ?Sized,
{
    store.save_challenge(record).await?;
    log::debug!("Challenge saved.");
    Ok(())
}

/// Atomically find and delete the record for `challenge`.
///
/// Fails with [`UafError::ChallengeNotFound`] if the challenge was already consumed, has expired or
/// was never issued. A consumed challenge is never restored, even if the response it came with is
/// later rejected.
pub async fn consume<S>(store: &S, challenge: &str) -> Result<ChallengeRecord, UafError>
where
    S: UafStore + ?Sized,
{
    match store.find_and_delete_challenge(challenge).await? {
        Some(record) => {
            log::debug!("Challenge consumed.");
            Ok(record)
        }
        None => {
            log::warn!("Challenge not found, it was consumed, expired or never issued.");
            Err(UafError::ChallengeNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use uaf_types::protocol::Policy;

    use super::*;
    use crate::{MemoryStore, MockUafStore, StoreError};

    fn record(challenge: &str) -> ChallengeRecord {
        ChallengeRecord {
            challenge: challenge.to_owned(),
            op: Operation::Reg,
            server_data: new_server_data(),
            username: Some("alice".into()),
            policy: Policy::default(),
            transaction: None,
        }
    }

    #[tokio::test]
    async fn challenges_are_single_use() {
        let store = MemoryStore::new();
        let challenge = new_challenge();
        issue(&store, record(&challenge)).await.expect("saved");

        let consumed = consume(&store, &challenge).await.expect("first use");
        assert_eq!(consumed.username.as_deref(), Some("alice"));
        assert_eq!(
            consume(&store, &challenge).await,
            Err(UafError::ChallengeNotFound)
        );
    }

    #[tokio::test]
    async fn expired_challenges_are_gone() {
        let store = MemoryStore::with_challenge_ttl(Duration::ZERO);
        let challenge = new_challenge();
        issue(&store, record(&challenge)).await.expect("saved");
        assert_eq!(
            consume(&store, &challenge).await,
            Err(UafError::ChallengeNotFound)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumers_race_for_one_success() {
        let store = Arc::new(MemoryStore::new());
        let challenge = new_challenge();
        issue(&*store, record(&challenge)).await.expect("saved");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let challenge = challenge.clone();
                tokio::spawn(async move { consume(&*store, &challenge).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.expect("task completes") {
                Ok(_) => successes += 1,
                Err(e) => assert_eq!(e, UafError::ChallengeNotFound),
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn storage_faults_are_not_protocol_failures() {
        let mut store = MockUafStore::new();
        store
            .expect_find_and_delete_challenge()
            .returning(|_| Err(StoreError::Unavailable("connection refused".into())))
            .once();

        let result = consume(&store, "Y2hhbGxlbmdlY2hhbGxlbmdl").await;
        assert!(matches!(
            result,
            Err(UafError::Storage(StoreError::Unavailable(_)))
        ));
    }

    #[test]
    fn generated_values_have_full_entropy() {
        assert_eq!(new_challenge().len(), 43);
        assert_ne!(new_challenge(), new_challenge());
    }
}
