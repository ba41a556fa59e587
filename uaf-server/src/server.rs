use std::time::Duration;

use serde_json::Value;
use uaf_types::{
    encoding,
    metadata::{MetadataStatement, TrustedFacetList},
    protocol::{
        Operation, RequestEnvelope, ReturnUafRequest, Transaction, UafRequest, UafResponse,
    },
    record::{AuthenticatorRecord, RecordId, StoredAuthenticator},
    tlv, Aaid, Assertion, StatusCode,
};

use crate::{
    challenge::{self, new_challenge, new_server_data},
    request::{self, DeregistrationTarget},
    schema::{self, ResponseValidator, ValidationContext},
    verify, AuthenticatorSelector, ChallengeRecord, ServerConfig, UafError, UafStore,
};


/// A request ready to be handed to a UAF client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRequest {
    /// The request.
    pub request: UafRequest,
    /// How long the server accepts a response.
    pub lifetime: Duration,
}

impl IssuedRequest {
    /// The challenge persisted for this request. Deregistration requests have none.
    pub fn challenge(&self) -> Option<&str> {
        self.request.challenge()
    }

    /// The `{ "uafRequest": [...] }` envelope.
    pub fn envelope(&self) -> RequestEnvelope {
        RequestEnvelope {
            uaf_request: vec![self.request.clone()],
        }
    }

    /// The transport message carrying the serialized request array.
    pub fn return_message(&self) -> Result<ReturnUafRequest, UafError> {
        let uaf_request = serde_json::to_string(&[&self.request])
            .map_err(|e| UafError::schema("/uafRequest", e.to_string()))?;
        Ok(ReturnUafRequest {
            status_code: StatusCode::Ok,
            uaf_request,
            op: self.request.op(),
            lifetime_millis: u64::try_from(self.lifetime.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// Outcome of a successful registration or authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Always [`StatusCode::Ok`].
    pub status_code: StatusCode,
    /// The created or authenticated record.
    pub authenticator_id: RecordId,
    /// Owner of the record.
    pub username: String,
}

impl Completion {
    fn new(authenticator_id: RecordId, username: String) -> Self {
        Self {
            status_code: StatusCode::Ok,
            authenticator_id,
            username,
        }
    }
}

/// Everything checked before the operation specific steps.
struct Verified {
    response: UafResponse,
    buffer: Vec<u8>,
    assertion: Assertion,
    challenge: ChallengeRecord,
    metadata: MetadataStatement,
}

/// The UAF protocol engine.
///
/// Each operation is a pair of calls: a `start_*` call issuing a request and persisting its
/// challenge, and a `finish_*` call verifying the client's response. The server holds no state of
/// its own between the two, everything goes through the [`UafStore`].
pub struct UafServer<S> {
    store: S,
    config: ServerConfig,
}

impl<S> UafServer<S>
where
    S: UafStore,
{
    /// Create a server persisting into `store`.
    pub fn new(store: S, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// Builder method setting the application identifier.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.config.app_id = app_id.into();
        self
    }

    /// Builder method setting the policy loaded for Reg and Auth requests.
    pub fn policy_name(mut self, name: impl Into<String>) -> Self {
        self.config.policy_name = name.into();
        self
    }

    /// Builder method setting the advertised request lifetime.
    pub fn request_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.request_lifetime = lifetime;
        self
    }

    /// Access the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn issued(&self, request: UafRequest) -> IssuedRequest {
        IssuedRequest {
            request,
            lifetime: self.config.request_lifetime,
        }
    }

    /// Issue a registration request for `username`.
    ///
    /// `server_data` is an optional correlator echoed by the client, a random one is generated when
    /// absent.
    pub async fn start_registration(
        &self,
        username: &str,
        server_data: Option<String>,
    ) -> Result<IssuedRequest, UafError> {
        log::info!("Registration requested.");
        let policy = self.store.find_policy(&self.config.policy_name).await?;
        let known = self
            .store
            .find_authenticators(&AuthenticatorSelector::Username(username.to_owned()))
            .await?;

        let request = request::registration(
            &self.config,
            username,
            policy,
            &known,
            new_challenge(),
            server_data.unwrap_or_else(new_server_data),
        );
        challenge::issue(&self.store, ChallengeRecord::for_registration(&request)).await?;

        log::info!("Registration request issued.");
        Ok(self.issued(UafRequest::Registration(request)))
    }

    /// Issue an authentication request.
    ///
    /// Without a `username` any registered authenticator may answer. A `transaction` is shown to
    /// the user for confirmation and needs a username, so that the display format can be looked
    /// up in the metadata of the user's authenticators.
    pub async fn start_authentication(
        &self,
        username: Option<&str>,
        transaction: Option<&str>,
        server_data: Option<String>,
    ) -> Result<IssuedRequest, UafError> {
        log::info!("Authentication requested.");
        let policy = self.store.find_policy(&self.config.policy_name).await?;
        let known = match username {
            Some(username) => Some(
                self.store
                    .find_authenticators(&AuthenticatorSelector::Username(username.to_owned()))
                    .await?,
            ),
            None => None,
        };

        let transaction = match (transaction, known.as_deref()) {
            (Some(text), Some(known)) if !known.is_empty() => {
                Some(self.transaction_for(known, text).await?)
            }
            (Some(_), None) => {
                log::warn!("Authentication rejected: a transaction needs a username.");
                return Err(UafError::PolicyViolation(
                    "a transaction requires a username".into(),
                ));
            }
            _ => None,
        };

        let request = request::authentication(
            &self.config,
            policy,
            known.as_deref(),
            transaction,
            new_challenge(),
            server_data.unwrap_or_else(new_server_data),
        )?;
        challenge::issue(
            &self.store,
            ChallengeRecord::for_authentication(&request, username),
        )
        .await?;

        log::info!("Authentication request issued.");
        Ok(self.issued(UafRequest::Authentication(request)))
    }

    async fn transaction_for(
        &self,
        known: &[StoredAuthenticator],
        text: &str,
    ) -> Result<Transaction, UafError> {
        for authenticator in known {
            let statements = self
                .store
                .find_metadata(&authenticator.record.aaid, self.config.upv)
                .await?;
            let content_type = statements
                .iter()
                .filter(|statement| statement.tc_display != 0)
                .find_map(|statement| statement.tc_display_content_type.as_deref());
            if let Some(content_type) = content_type {
                return request::transaction(content_type, text);
            }
        }
        log::warn!("None of the user's authenticators can display a transaction.");
        Err(UafError::UnsupportedTransactionFormat(
            "no transaction display".into(),
        ))
    }

    /// Issue a deregistration request for `username` and delete the targeted records.
    pub async fn start_deregistration(
        &self,
        username: &str,
        target: DeregistrationTarget,
    ) -> Result<IssuedRequest, UafError> {
        log::info!("Deregistration requested.");
        let selector = match &target {
            DeregistrationTarget::Aaid(aaid) => {
                AuthenticatorSelector::UsernameAndAaid(username.to_owned(), aaid.clone())
            }
            DeregistrationTarget::All | DeregistrationTarget::Known => {
                AuthenticatorSelector::Username(username.to_owned())
            }
        };
        let targeted: Vec<_> = self
            .store
            .find_authenticators(&selector)
            .await?
            .into_iter()
            .filter(|authenticator| target.selects(authenticator))
            .collect();

        let request = request::deregistration(&self.config, &target, &targeted);

        if !targeted.is_empty() {
            let ids: Vec<RecordId> = targeted.into_iter().map(|a| a.id).collect();
            let deleted = self.store.delete_authenticators(&ids).await?;
            log::debug!("Deleted {deleted} authenticators.");
        }

        log::info!("Deregistration request issued.");
        Ok(self.issued(UafRequest::Deregistration(request)))
    }

    /// Verify a registration response and store the new authenticator.
    pub async fn finish_registration(&self, response: &Value) -> Result<Completion, UafError> {
        log::info!("Registration response received.");
        let verified = self.verify_response(response, Operation::Reg).await?;
        let Assertion::Registration(registration) = &verified.assertion else {
            return Err(UafError::schema("", "expected a registration assertion"));
        };
        let Some(username) = verified.challenge.username.clone() else {
            return Err(UafError::PolicyViolation(
                "registration challenge without username".into(),
            ));
        };

        let public_key =
            verify::verify_registration(registration, &verified.buffer, &verified.metadata)?;

        let key_id = verified.assertion.key_id_base64url();
        let krd = &registration.key_registration_data;
        let entry = verified.response.assertions.into_iter().next();
        let record = AuthenticatorRecord {
            username: username.clone(),
            aaid: krd.aaid.clone(),
            key_id,
            public_key,
            signature_counter: krd.counters.signature_counter,
            registration_counter: krd.counters.registration_counter,
            authenticator_version: krd.info.authenticator_version,
            tc_display_png_characteristics: entry
                .as_ref()
                .and_then(|entry| entry.tc_display_png_characteristics.clone()),
            exts: entry.and_then(|entry| entry.exts),
        };
        let Some(id) = self.store.save_authenticator(record).await? else {
            log::warn!("Registration rejected: the key ID is already registered.");
            return Err(UafError::PolicyViolation("key ID already registered".into()));
        };

        log::info!("Registration successful.");
        Ok(Completion::new(id, username))
    }

    /// Verify an authentication response and advance the signature counter.
    pub async fn finish_authentication(&self, response: &Value) -> Result<Completion, UafError> {
        log::info!("Authentication response received.");
        let verified = self.verify_response(response, Operation::Auth).await?;
        let Assertion::Authentication(authentication) = &verified.assertion else {
            return Err(UafError::schema("", "expected an authentication assertion"));
        };

        let Some(stored) = self
            .store
            .find_authenticators(&AuthenticatorSelector::KeyId(
                verified.assertion.key_id_base64url(),
            ))
            .await?
            .into_iter()
            .next()
        else {
            log::warn!("Authentication rejected: unknown key ID.");
            return Err(UafError::UnknownKeyId);
        };

        if let Some(username) = &verified.challenge.username {
            if &stored.record.username != username {
                log::warn!("Authentication rejected: the key belongs to another user.");
                return Err(UafError::PolicyViolation(
                    "authenticator is not registered to the challenged user".into(),
                ));
            }
        }
        if stored.record.aaid != authentication.signed_data.aaid {
            log::warn!("Authentication rejected: the key was registered on another model.");
            return Err(UafError::MetadataMismatch("aaid"));
        }

        verify::verify_authentication(authentication, &verified.buffer, &stored.record)?;
        verify::check_transaction(
            &authentication.signed_data,
            verified.challenge.transaction.as_deref(),
        )?;

        let counter = authentication.signed_data.counters.signature_counter;
        verify::check_counter(stored.record.signature_counter, counter)?;
        if !self
            .store
            .update_signature_counter(&stored.id, counter)
            .await?
        {
            log::warn!("Authentication rejected: the counter was advanced concurrently.");
            return Err(UafError::ReplayDetected);
        }

        log::info!("Authentication successful.");
        Ok(Completion::new(stored.id, stored.record.username))
    }

    /// Handle the client's `[UafResponse]` array, dispatching on the operation of its first
    /// element.
    pub async fn respond(&self, message: &Value) -> Result<Completion, UafError> {
        let Some(response) = message.as_array().and_then(|responses| responses.first()) else {
            return Err(UafError::schema("", "must be a non-empty array"));
        };
        match response["header"]["op"].as_str() {
            Some("Reg") => self.finish_registration(response).await,
            Some("Auth") => self.finish_authentication(response).await,
            _ => {
                log::warn!("Response with an unexpected operation.");
                Err(UafError::schema("/0/header/op", "must be one of Reg, Auth"))
            }
        }
    }

    /// The trusted facet list published at the application identifier.
    pub async fn trusted_facets(&self) -> Result<TrustedFacetList, UafError> {
        let trusted_facets = self.store.find_trusted_facets(&self.config.app_id).await?;
        Ok(TrustedFacetList { trusted_facets })
    }

    async fn validator(&self, op: Operation) -> Result<ResponseValidator, UafError> {
        let facets = self.trusted_facets().await?;
        let facet_ids = facets
            .for_version(self.config.upv)
            .map(|facets| facets.ids.clone())
            .unwrap_or_default();
        Ok(ResponseValidator::new(ValidationContext {
            operations: vec![op],
            facet_ids,
            app_id: self.config.app_id.clone(),
        }))
    }

    async fn metadata(&self, aaid: &Aaid) -> Result<MetadataStatement, UafError> {
        let mut statements = self.store.find_metadata(aaid, self.config.upv).await?;
        match (statements.pop(), statements.is_empty()) {
            (Some(statement), true) => Ok(statement),
            _ => {
                log::warn!("Metadata for {aaid} did not resolve to exactly one statement.");
                Err(UafError::UnknownAaid(aaid.to_string()))
            }
        }
    }

    async fn verify_response(&self, value: &Value, op: Operation) -> Result<Verified, UafError> {
        let validator = self.validator(op).await?;
        let response = validator.response(value)?;
        let entry = response
            .assertions
            .first()
            .ok_or_else(|| UafError::schema("/assertions", "must contain exactly 1 item"))?;

        let buffer = encoding::try_from_any_base64(&entry.assertion)
            .ok_or_else(|| UafError::schema("/assertions/0/assertion", "must be base64url"))?;
        let nodes = tlv::decode(&buffer)?;
        schema::assertion(&nodes)?;
        let assertion = Assertion::from_nodes(&nodes)?;
        match (&assertion, op) {
            (Assertion::Registration(_), Operation::Reg)
            | (Assertion::Authentication(_), Operation::Auth) => {}
            _ => {
                log::warn!("Assertion type does not match the {op} operation.");
                return Err(UafError::schema("", format!("not a {op} assertion")));
            }
        }

        verify::check_final_challenge(&assertion, &response.fc_params)?;
        let params = validator.final_challenge_params(&response.fc_params)?;

        let challenge = challenge::consume(&self.store, &params.challenge).await?;
        if challenge.op != op {
            log::warn!("Challenge was issued for {}, not {op}.", challenge.op);
            return Err(UafError::BindingMismatch("operation"));
        }
        if response.header.server_data.as_deref().unwrap_or_default() != challenge.server_data {
            log::warn!("Server data does not match the challenge.");
            return Err(UafError::BindingMismatch("server data"));
        }

        let metadata = self.metadata(assertion.aaid()).await?;
        verify::check_metadata(&assertion, &metadata)?;
        verify::check_display(&metadata, entry.tc_display_png_characteristics.as_deref())?;

        Ok(Verified {
            response,
            buffer,
            assertion,
            challenge,
            metadata,
        })
    }
}
