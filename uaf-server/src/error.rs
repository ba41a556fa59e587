use uaf_types::{tlv::TlvError, AssertionShapeError, StatusCode};

/// A field level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// JSON pointer like path of the offending field, e.g. `/header/op` or
    /// `/TAG_UAFV1_KRD/TAG_AAID`.
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Failures of the persistence layer. Never used for protocol validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record that had to exist was not found. Carries the collection name.
    NotFound(&'static str),
    /// The store could not be reached or failed internally.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(collection) => write!(f, "no matching {collection} record"),
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Why an operation was rejected. Every failure is terminal for the attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UafError {
    /// The assertion is not well formed TLV.
    MalformedInput(TlvError),
    /// A message did not match its schema.
    SchemaInvalid(Vec<Diagnostic>),
    /// The challenge was consumed, expired or never issued.
    ChallengeNotFound,
    /// The assertion does not match the authenticator's metadata.
    MetadataMismatch(&'static str),
    /// A signature did not verify.
    SignatureInvalid,
    /// The signature counter did not advance.
    ReplayDetected,
    /// The assertion is not bound to the challenge, transaction or server data it answers.
    BindingMismatch(&'static str),
    /// Transaction content cannot be shown in the authenticator's display format.
    UnsupportedTransactionFormat(String),
    /// The caller is not allowed to perform the operation as requested.
    PolicyViolation(String),
    /// The signature or key algorithm is not implemented.
    UnsupportedAlgorithm(u16),
    /// Metadata did not resolve to exactly one statement for the AAID.
    UnknownAaid(String),
    /// No registration exists for the asserted key ID.
    UnknownKeyId,
    /// The persistence layer failed.
    Storage(StoreError),
}

impl UafError {
    /// The status code reported to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UafError::MalformedInput(_) => StatusCode::BadRequest,
            UafError::SignatureInvalid => StatusCode::Unauthorized,
            UafError::PolicyViolation(_) => StatusCode::Forbidden,
            UafError::Storage(StoreError::NotFound(_)) => StatusCode::NotFound,
            UafError::UnknownAaid(_) => StatusCode::UnknownAaid,
            UafError::UnknownKeyId => StatusCode::UnknownKeyId,
            UafError::BindingMismatch(_) => StatusCode::ChannelBindingRefused,
            UafError::ChallengeNotFound => StatusCode::RequestInvalid,
            UafError::MetadataMismatch(_) => StatusCode::UnacceptableAuthenticator,
            UafError::ReplayDetected => StatusCode::RevokedAuthenticator,
            UafError::UnsupportedAlgorithm(_) => StatusCode::UnacceptableAlgorithm,
            UafError::UnsupportedTransactionFormat(_) => {
                StatusCode::UnacceptableClientCapabilities
            }
            UafError::SchemaInvalid(_) => StatusCode::UnacceptableContent,
            UafError::Storage(StoreError::Unavailable(_)) => StatusCode::InternalServerError,
        }
    }

    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        UafError::SchemaInvalid(vec![Diagnostic::new(path, message)])
    }
}

impl std::fmt::Display for UafError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UafError::MalformedInput(e) => write!(f, "malformed assertion: {e}"),
            UafError::SchemaInvalid(diagnostics) => {
                f.write_str("schema validation failed")?;
                for (i, diagnostic) in diagnostics.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{sep}{diagnostic}")?;
                }
                Ok(())
            }
            UafError::ChallengeNotFound => f.write_str("challenge not found"),
            UafError::MetadataMismatch(check) => {
                write!(f, "assertion failed metadata {check} check")
            }
            UafError::SignatureInvalid => f.write_str("signature verification failed"),
            UafError::ReplayDetected => f.write_str("signature counter did not advance"),
            UafError::BindingMismatch(what) => write!(f, "{what} does not match"),
            UafError::UnsupportedTransactionFormat(content_type) => {
                write!(f, "unsupported transaction content type '{content_type}'")
            }
            UafError::PolicyViolation(reason) => write!(f, "policy violation: {reason}"),
            UafError::UnsupportedAlgorithm(code) => write!(f, "unsupported algorithm {code:#06x}"),
            UafError::UnknownAaid(aaid) => write!(f, "no unique metadata for AAID '{aaid}'"),
            UafError::UnknownKeyId => f.write_str("unknown key ID"),
            UafError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for UafError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UafError::MalformedInput(e) => Some(e),
            UafError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TlvError> for UafError {
    fn from(e: TlvError) -> Self {
        UafError::MalformedInput(e)
    }
}

impl From<StoreError> for UafError {
    fn from(e: StoreError) -> Self {
        UafError::Storage(e)
    }
}

impl From<AssertionShapeError> for UafError {
    fn from(e: AssertionShapeError) -> Self {
        UafError::schema("", e.to_string())
    }
}
