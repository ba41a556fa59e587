use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use uaf_types::{
    metadata::{MetadataStatement, TrustedFacets},
    protocol::{Policy, Version},
    record::{AuthenticatorRecord, RecordId, StoredAuthenticator},
    Aaid,
};

use crate::{ChallengeRecord, StoreError};

/// How authenticator records are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorSelector {
    /// Every record owned by the user.
    Username(String),
    /// Records owned by the user on authenticators of one model.
    UsernameAndAaid(String, Aaid),
    /// The record holding a key ID.
    KeyId(String),
}

impl AuthenticatorSelector {
    /// Whether `record` is selected.
    pub fn matches(&self, record: &AuthenticatorRecord) -> bool {
        match self {
            AuthenticatorSelector::Username(username) => &record.username == username,
            AuthenticatorSelector::UsernameAndAaid(username, aaid) => {
                &record.username == username && &record.aaid == aaid
            }
            AuthenticatorSelector::KeyId(key_id) => &record.key_id == key_id,
        }
    }
}

/// Typed persistence for the collections the UAF engine reads and writes: policies,
/// authenticators, metadata, challenges and trusted facet lists.
///
/// Implementations must make [`UafStore::find_and_delete_challenge`] atomic, and should make
/// [`UafStore::save_authenticator`] and [`UafStore::update_signature_counter`] single conditional
/// writes.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait UafStore: Send + Sync {
    /// Load the named policy.
    async fn find_policy(&self, name: &str) -> Result<Policy, StoreError>;

    /// Every authenticator record matching `selector`.
    async fn find_authenticators(
        &self,
        selector: &AuthenticatorSelector,
    ) -> Result<Vec<StoredAuthenticator>, StoreError>;

    /// Insert a new record, only if no record holds its key ID. Returns the new record's
    /// identifier, or `None` when the key ID is already registered.
    async fn save_authenticator(
        &self,
        record: AuthenticatorRecord,
    ) -> Result<Option<RecordId>, StoreError>;

    /// Set the signature counter of record `id` to `counter`, only if the stored counter is `0` or
    /// lower than `counter`. Returns whether the write happened.
    async fn update_signature_counter(&self, id: &RecordId, counter: u32)
        -> Result<bool, StoreError>;

    /// Delete the given records, returning how many existed.
    async fn delete_authenticators(&self, ids: &[RecordId]) -> Result<usize, StoreError>;

    /// Metadata statements for `aaid` supporting `version`.
    async fn find_metadata(
        &self,
        aaid: &Aaid,
        version: Version,
    ) -> Result<Vec<MetadataStatement>, StoreError>;

    /// The trusted facet list published for `app_id`.
    async fn find_trusted_facets(&self, app_id: &str) -> Result<Vec<TrustedFacets>, StoreError>;

    /// Persist an issued challenge.
    async fn save_challenge(&self, challenge: ChallengeRecord) -> Result<(), StoreError>;

    /// Atomically remove and return the record for `challenge`, if it exists and has not expired.
    async fn find_and_delete_challenge(
        &self,
        challenge: &str,
    ) -> Result<Option<ChallengeRecord>, StoreError>;
}

#[async_trait::async_trait]
impl<S: UafStore + ?Sized> UafStore for Arc<S> {
    async fn find_policy(&self, name: &str) -> Result<Policy, StoreError> {
        (**self).find_policy(name).await
    }

    async fn find_authenticators(
        &self,
        selector: &AuthenticatorSelector,
    ) -> Result<Vec<StoredAuthenticator>, StoreError> {
        (**self).find_authenticators(selector).await
    }

    async fn save_authenticator(
        &self,
        record: AuthenticatorRecord,
    ) -> Result<Option<RecordId>, StoreError> {
        (**self).save_authenticator(record).await
    }

    async fn update_signature_counter(
        &self,
        id: &RecordId,
        counter: u32,
    ) -> Result<bool, StoreError> {
        (**self).update_signature_counter(id, counter).await
    }

    async fn delete_authenticators(&self, ids: &[RecordId]) -> Result<usize, StoreError> {
        (**self).delete_authenticators(ids).await
    }

    async fn find_metadata(
        &self,
        aaid: &Aaid,
        version: Version,
    ) -> Result<Vec<MetadataStatement>, StoreError> {
        (**self).find_metadata(aaid, version).await
    }

    async fn find_trusted_facets(&self, app_id: &str) -> Result<Vec<TrustedFacets>, StoreError> {
        (**self).find_trusted_facets(app_id).await
    }

    async fn save_challenge(&self, challenge: ChallengeRecord) -> Result<(), StoreError> {
        (**self).save_challenge(challenge).await
    }

    async fn find_and_delete_challenge(
        &self,
        challenge: &str,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        (**self).find_and_delete_challenge(challenge).await
    }
}

/// Default lifetime of challenges in a [`MemoryStore`].
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct Collections {
    policies: HashMap<String, Policy>,
    authenticators: BTreeMap<RecordId, AuthenticatorRecord>,
    metadata: Vec<MetadataStatement>,
    facets: HashMap<String, Vec<TrustedFacets>>,
    challenges: HashMap<String, (Instant, ChallengeRecord)>,
}

/// In-memory store.
///
/// Useful for tests and demos. Expired challenges are evicted lazily whenever the challenge
/// collection is touched.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    challenge_ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store whose challenges live for [`DEFAULT_CHALLENGE_TTL`].
    pub fn new() -> Self {
        Self::with_challenge_ttl(DEFAULT_CHALLENGE_TTL)
    }

    /// An empty store whose challenges live for `ttl`.
    pub fn with_challenge_ttl(ttl: Duration) -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
            challenge_ttl: ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Builder method adding a named policy.
    pub fn with_policy(self, name: impl Into<String>, policy: Policy) -> Self {
        if let Ok(mut collections) = self.lock() {
            collections.policies.insert(name.into(), policy);
        }
        self
    }

    /// Builder method adding a metadata statement.
    pub fn with_metadata(self, statement: MetadataStatement) -> Self {
        if let Ok(mut collections) = self.lock() {
            collections.metadata.push(statement);
        }
        self
    }

    /// Builder method publishing a trusted facet list for `app_id`.
    pub fn with_trusted_facets(
        self,
        app_id: impl Into<String>,
        facets: Vec<TrustedFacets>,
    ) -> Self {
        if let Ok(mut collections) = self.lock() {
            collections.facets.insert(app_id.into(), facets);
        }
        self
    }

    /// Look at a stored record.
    pub fn authenticator(&self, id: &RecordId) -> Option<AuthenticatorRecord> {
        self.lock().ok()?.authenticators.get(id).cloned()
    }

    /// Number of stored records.
    pub fn authenticator_count(&self) -> usize {
        self.lock().map(|c| c.authenticators.len()).unwrap_or_default()
    }

    /// Number of live challenges.
    pub fn challenge_count(&self) -> usize {
        self.lock()
            .map(|mut c| {
                evict_expired(&mut c.challenges, self.challenge_ttl);
                c.challenges.len()
            })
            .unwrap_or_default()
    }
}

fn evict_expired(challenges: &mut HashMap<String, (Instant, ChallengeRecord)>, ttl: Duration) {
    challenges.retain(|_, (created, _)| created.elapsed() < ttl);
}

#[async_trait::async_trait]
impl UafStore for MemoryStore {
    async fn find_policy(&self, name: &str) -> Result<Policy, StoreError> {
        self.lock()?
            .policies
            .get(name)
            .cloned()
            .ok_or(StoreError::NotFound("policies"))
    }

    async fn find_authenticators(
        &self,
        selector: &AuthenticatorSelector,
    ) -> Result<Vec<StoredAuthenticator>, StoreError> {
        Ok(self
            .lock()?
            .authenticators
            .iter()
            .filter(|(_, record)| selector.matches(record))
            .map(|(id, record)| StoredAuthenticator {
                id: id.clone(),
                record: record.clone(),
            })
            .collect())
    }

    async fn save_authenticator(
        &self,
        record: AuthenticatorRecord,
    ) -> Result<Option<RecordId>, StoreError> {
        let mut collections = self.lock()?;
        if collections
            .authenticators
            .values()
            .any(|stored| stored.key_id == record.key_id)
        {
            return Ok(None);
        }
        let id = RecordId::random();
        collections.authenticators.insert(id.clone(), record);
        Ok(Some(id))
    }

    async fn update_signature_counter(
        &self,
        id: &RecordId,
        counter: u32,
    ) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        let record = collections
            .authenticators
            .get_mut(id)
            .ok_or(StoreError::NotFound("authenticators"))?;
        if record.signature_counter == 0 || record.signature_counter < counter {
            record.signature_counter = counter;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_authenticators(&self, ids: &[RecordId]) -> Result<usize, StoreError> {
        let mut collections = self.lock()?;
        Ok(ids
            .iter()
            .filter(|id| collections.authenticators.remove(*id).is_some())
            .count())
    }

    async fn find_metadata(
        &self,
        aaid: &Aaid,
        version: Version,
    ) -> Result<Vec<MetadataStatement>, StoreError> {
        Ok(self
            .lock()?
            .metadata
            .iter()
            .filter(|statement| &statement.aaid == aaid && statement.supports(version))
            .cloned()
            .collect())
    }

    async fn find_trusted_facets(&self, app_id: &str) -> Result<Vec<TrustedFacets>, StoreError> {
        match self.lock()?.facets.get(app_id) {
            Some(facets) if !facets.is_empty() => Ok(facets.clone()),
            _ => Err(StoreError::NotFound("facets")),
        }
    }

    async fn save_challenge(&self, challenge: ChallengeRecord) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        evict_expired(&mut collections.challenges, self.challenge_ttl);
        collections
            .challenges
            .insert(challenge.challenge.clone(), (Instant::now(), challenge));
        Ok(())
    }

    async fn find_and_delete_challenge(
        &self,
        challenge: &str,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        let mut collections = self.lock()?;
        evict_expired(&mut collections.challenges, self.challenge_ttl);
        Ok(collections
            .challenges
            .remove(challenge)
            .map(|(_, record)| record))
    }
}

#[cfg(test)]
mod tests {
    use uaf_types::{algorithm::PublicKeyEncoding, record::PublicKeyMaterial};

    use super::*;

    fn record(username: &str, aaid: &str, key_id: &str, counter: u32) -> AuthenticatorRecord {
        AuthenticatorRecord {
            username: username.into(),
            aaid: aaid.parse().expect("valid aaid"),
            key_id: key_id.into(),
            public_key: PublicKeyMaterial {
                encoding: PublicKeyEncoding::EccX962Raw,
                key: vec![4u8; 65].into(),
            },
            signature_counter: counter,
            registration_counter: None,
            authenticator_version: 1,
            tc_display_png_characteristics: None,
            exts: None,
        }
    }

    async fn save(store: &MemoryStore, record: AuthenticatorRecord) -> RecordId {
        store
            .save_authenticator(record)
            .await
            .expect("saved")
            .expect("new key ID")
    }

    #[tokio::test]
    async fn selectors_filter_records() {
        let store = MemoryStore::new();
        save(&store, record("alice", "ABCD#0001", "a2V5MQ", 0)).await;
        save(&store, record("alice", "ABCD#0002", "a2V5Mg", 0)).await;
        save(&store, record("bob", "ABCD#0001", "a2V5Mw", 0)).await;

        let alice = AuthenticatorSelector::Username("alice".into());
        assert_eq!(store.find_authenticators(&alice).await.expect("found").len(), 2);

        let aaid = "ABCD#0001".parse().expect("valid aaid");
        let alice_0001 = AuthenticatorSelector::UsernameAndAaid("alice".into(), aaid);
        assert_eq!(
            store.find_authenticators(&alice_0001).await.expect("found").len(),
            1
        );

        let key = AuthenticatorSelector::KeyId("a2V5Mw".into());
        let found = store.find_authenticators(&key).await.expect("found");
        assert_eq!(found[0].record.username, "bob");
    }

    #[tokio::test]
    async fn key_ids_are_registered_once() {
        let store = MemoryStore::new();
        save(&store, record("alice", "ABCD#0001", "a2V5", 0)).await;

        let again = store
            .save_authenticator(record("bob", "ABCD#0002", "a2V5", 0))
            .await
            .expect("ran");
        assert_eq!(again, None);
        assert_eq!(store.authenticator_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_saves_of_one_key_id_store_one_record() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .save_authenticator(record("alice", "ABCD#0001", "a2V5", 0))
                        .await
                        .expect("ran")
                })
            })
            .collect();

        let mut saved = 0;
        for handle in handles {
            if handle.await.expect("task completes").is_some() {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
        assert_eq!(store.authenticator_count(), 1);
    }

    #[tokio::test]
    async fn counter_updates_are_conditional() {
        let store = MemoryStore::new();
        let id = save(&store, record("alice", "ABCD#0001", "a2V5", 5)).await;

        assert!(!store.update_signature_counter(&id, 5).await.expect("ran"));
        assert!(!store.update_signature_counter(&id, 4).await.expect("ran"));
        assert!(store.update_signature_counter(&id, 6).await.expect("ran"));
        assert_eq!(store.authenticator(&id).map(|r| r.signature_counter), Some(6));

        assert_eq!(
            store.update_signature_counter(&RecordId::random(), 1).await,
            Err(StoreError::NotFound("authenticators"))
        );
    }

    #[tokio::test]
    async fn zero_counters_accept_any_value() {
        let store = MemoryStore::new();
        let id = save(&store, record("alice", "ABCD#0001", "a2V5", 0)).await;
        assert!(store.update_signature_counter(&id, 0).await.expect("ran"));
    }

    #[tokio::test]
    async fn deleting_reports_existing_records() {
        let store = MemoryStore::new();
        let id = save(&store, record("alice", "ABCD#0001", "a2V5", 0)).await;
        let deleted = store
            .delete_authenticators(&[id.clone(), RecordId::random()])
            .await
            .expect("deleted");
        assert_eq!(deleted, 1);
        assert_eq!(store.authenticator_count(), 0);
    }

    #[tokio::test]
    async fn missing_reference_data_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(
            store.find_policy("policy0").await,
            Err(StoreError::NotFound("policies"))
        );
        assert_eq!(
            store.find_trusted_facets("https://example.com").await,
            Err(StoreError::NotFound("facets"))
        );
    }
}
