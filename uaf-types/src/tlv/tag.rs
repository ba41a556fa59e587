repr_enum! {
    /// Tags of the `UAFV1TLV` assertion scheme.
    ///
    /// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-reg-v1.1-ps-20170202.html#tags-used-in-the-protocol>
    Tag: u16 {
        /// Authenticator response to a Register command.
        RegAssertion: 0x3E01,
        /// Authenticator response to a Sign command.
        AuthAssertion: 0x3E02,
        /// Key Registration Data, the signed part of a registration assertion.
        KeyRegistrationData: 0x3E03,
        /// The signed part of an authentication assertion.
        SignedData: 0x3E04,
        /// DER encoded attestation certificate. May be repeated to carry a chain.
        AttestationCert: 0x2E05,
        /// Cryptographic signature.
        Signature: 0x2E06,
        /// Full basic attestation block.
        AttestationBasicFull: 0x3E07,
        /// Surrogate basic attestation block, signed by the new credential's own key.
        AttestationBasicSurrogate: 0x3E08,
        /// Key identifier of the credential.
        KeyId: 0x2E09,
        /// Hash of the final challenge parameters.
        FinalChallenge: 0x2E0A,
        /// Authenticator Attestation ID.
        Aaid: 0x2E0B,
        /// Public key of the new credential.
        PubKey: 0x2E0C,
        /// Signature and registration counters.
        Counters: 0x2E0D,
        /// Authenticator version, authentication mode and algorithms.
        AssertionInfo: 0x2E0E,
        /// Nonce generated by the authenticator.
        AuthenticatorNonce: 0x2E0F,
        /// Hash of the transaction content that was displayed to the user.
        TransactionContentHash: 0x2E10,
        /// Critical extension.
        Extension: 0x3E11,
        /// Non-critical extension.
        ExtensionNonCritical: 0x3E12,
        /// Extension identifier.
        ExtensionId: 0x2E13,
        /// Extension data.
        ExtensionData: 0x2E14,
    }
}

/// Bit marking a tag whose value is a sequence of nested TLV nodes.
pub const CONTAINER_BIT: u16 = 0x1000;

impl Tag {
    /// Whether nodes with this tag carry child nodes instead of a raw payload.
    pub fn is_container(self) -> bool {
        self.code() & CONTAINER_BIT != 0
    }

    /// The name used for this tag in the UAF registry.
    pub fn name(self) -> &'static str {
        match self {
            Tag::RegAssertion => "TAG_UAFV1_REG_ASSERTION",
            Tag::AuthAssertion => "TAG_UAFV1_AUTH_ASSERTION",
            Tag::KeyRegistrationData => "TAG_UAFV1_KRD",
            Tag::SignedData => "TAG_UAFV1_SIGNED_DATA",
            Tag::AttestationCert => "TAG_ATTESTATION_CERT",
            Tag::Signature => "TAG_SIGNATURE",
            Tag::AttestationBasicFull => "TAG_ATTESTATION_BASIC_FULL",
            Tag::AttestationBasicSurrogate => "TAG_ATTESTATION_BASIC_SURROGATE",
            Tag::KeyId => "TAG_KEYID",
            Tag::FinalChallenge => "TAG_FINAL_CHALLENGE",
            Tag::Aaid => "TAG_AAID",
            Tag::PubKey => "TAG_PUB_KEY",
            Tag::Counters => "TAG_COUNTERS",
            Tag::AssertionInfo => "TAG_ASSERTION_INFO",
            Tag::AuthenticatorNonce => "TAG_AUTHENTICATOR_NONCE",
            Tag::TransactionContentHash => "TAG_TRANSACTION_CONTENT_HASH",
            Tag::Extension => "TAG_EXTENSION",
            Tag::ExtensionNonCritical => "TAG_EXTENSION_NON_CRITICAL",
            Tag::ExtensionId => "TAG_EXTENSION_ID",
            Tag::ExtensionData => "TAG_EXTENSION_DATA",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
