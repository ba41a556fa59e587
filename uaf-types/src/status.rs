repr_enum! {
    /// UAF status codes returned to clients.
    ///
    /// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-client-api-transport-v1.1-ps-20170202.html#uaf-status-codes>
    StatusCode: u16 {
        /// Operation completed.
        Ok: 1200,
        /// Message accepted, but not completed at this time.
        Accepted: 1202,
        /// The server did not understand the message.
        BadRequest: 1400,
        /// The user must be authenticated, or the key ID is not associated with the user.
        Unauthorized: 1401,
        /// The user is not allowed to perform this operation.
        Forbidden: 1403,
        /// Not found.
        NotFound: 1404,
        /// Request timeout.
        RequestTimeout: 1408,
        /// No authoritative metadata for the AAID.
        UnknownAaid: 1480,
        /// No registration for the given key ID.
        UnknownKeyId: 1481,
        /// Missing or mismatched channel binding.
        ChannelBindingRefused: 1490,
        /// The request nonce was unknown, expired or already serviced.
        RequestInvalid: 1491,
        /// The authenticator is not acceptable according to the server's policy.
        UnacceptableAuthenticator: 1492,
        /// The authenticator is considered revoked.
        RevokedAuthenticator: 1493,
        /// The key used is unacceptable.
        UnacceptableKey: 1494,
        /// The algorithm used is unacceptable.
        UnacceptableAlgorithm: 1495,
        /// The attestation was not accepted.
        UnacceptableAttestation: 1496,
        /// The client capabilities could not be used.
        UnacceptableClientCapabilities: 1497,
        /// The contents of the message were not acceptable.
        UnacceptableContent: 1498,
        /// Internal server error.
        InternalServerError: 1500,
    }
}

impl StatusCode {
    /// Short human readable message for the code.
    pub fn message(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK.",
            StatusCode::Accepted => "Accepted.",
            StatusCode::BadRequest => "Bad Request.",
            StatusCode::Unauthorized => "Unauthorized.",
            StatusCode::Forbidden => "Forbidden.",
            StatusCode::NotFound => "Not Found.",
            StatusCode::RequestTimeout => "Request Timeout.",
            StatusCode::UnknownAaid => "Unknown AAID.",
            StatusCode::UnknownKeyId => "Unknown KeyID.",
            StatusCode::ChannelBindingRefused => "Channel Binding Refused.",
            StatusCode::RequestInvalid => "Request Invalid.",
            StatusCode::UnacceptableAuthenticator => "Unacceptable Authenticator.",
            StatusCode::RevokedAuthenticator => "Revoked Authenticator.",
            StatusCode::UnacceptableKey => "Unacceptable Key.",
            StatusCode::UnacceptableAlgorithm => "Unacceptable Algorithm.",
            StatusCode::UnacceptableAttestation => "Unacceptable Attestation.",
            StatusCode::UnacceptableClientCapabilities => "Unacceptable Client Capabilities.",
            StatusCode::UnacceptableContent => "Unacceptable Content.",
            StatusCode::InternalServerError => "Internal Server Error.",
        }
    }

    /// Whether the code reports success.
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::Accepted)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::StatusCode;

    #[test]
    fn serializes_as_the_bare_code() {
        assert_eq!(
            serde_json::to_string(&StatusCode::RevokedAuthenticator).expect("serializes"),
            "1493"
        );
        assert_eq!(
            serde_json::from_str::<StatusCode>("1491").expect("known code"),
            StatusCode::RequestInvalid
        );
        serde_json::from_str::<StatusCode>("1499").expect_err("unknown code");
    }
}
