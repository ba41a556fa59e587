use crate::algorithm::{AuthenticationMode, PublicKeyEncoding, SignatureAlgorithm};

/// Fields decoded from leaves whose payload has a fixed numeric layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafFields {
    /// Payload of [`Tag::Counters`](super::Tag::Counters).
    Counters(Counters),
    /// Payload of [`Tag::AssertionInfo`](super::Tag::AssertionInfo).
    AssertionInfo(AssertionInfo),
}

/// `TAG_COUNTERS`: a little-endian signature counter, optionally followed by the registration
/// counter. The variant is chosen by the declared length, 4 or 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// Incremented by the authenticator on every signature.
    pub signature_counter: u32,
    /// Incremented on every registration, only present in registration assertions.
    pub registration_counter: Option<u32>,
}

impl Counters {
    /// Decode from a 4 or 8 byte payload. Any other length has no defined layout.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [a, b, c, d] => Some(Self {
                signature_counter: u32::from_le_bytes([a, b, c, d]),
                registration_counter: None,
            }),
            [a, b, c, d, e, f, g, h] => Some(Self {
                signature_counter: u32::from_le_bytes([a, b, c, d]),
                registration_counter: Some(u32::from_le_bytes([e, f, g, h])),
            }),
            _ => None,
        }
    }

    /// Encode into the wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.signature_counter
            .to_le_bytes()
            .into_iter()
            .chain(self.registration_counter.into_iter().flat_map(u32::to_le_bytes))
            .collect()
    }
}

/// `TAG_ASSERTION_INFO`: a 5 byte layout in authentication assertions and a 7 byte layout, which
/// adds the public key encoding, in registration assertions.
///
/// | offset | size | field                     |
/// |--------|------|---------------------------|
/// | 0      | 2    | authenticator version     |
/// | 2      | 1    | authentication mode       |
/// | 3      | 2    | signature algorithm       |
/// | 5      | 2    | public key encoding (opt) |
///
/// The raw codes are kept so that unknown values can be reported instead of dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionInfo {
    /// Vendor assigned authenticator firmware version.
    pub authenticator_version: u16,
    /// `0x01` for a plain user verification, `0x02` when a transaction was confirmed.
    pub authentication_mode: u8,
    /// Signature algorithm and encoding, one of [`SignatureAlgorithm`].
    pub signature_algorithm: u16,
    /// Public key algorithm and encoding, one of [`PublicKeyEncoding`].
    pub public_key_algorithm: Option<u16>,
}

impl AssertionInfo {
    /// Decode from a 5 or 7 byte payload. Any other length has no defined layout.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [v0, v1, mode, s0, s1] => Some(Self {
                authenticator_version: u16::from_le_bytes([v0, v1]),
                authentication_mode: mode,
                signature_algorithm: u16::from_le_bytes([s0, s1]),
                public_key_algorithm: None,
            }),
            [v0, v1, mode, s0, s1, p0, p1] => Some(Self {
                authenticator_version: u16::from_le_bytes([v0, v1]),
                authentication_mode: mode,
                signature_algorithm: u16::from_le_bytes([s0, s1]),
                public_key_algorithm: Some(u16::from_le_bytes([p0, p1])),
            }),
            _ => None,
        }
    }

    /// Encode into the wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.authenticator_version
            .to_le_bytes()
            .into_iter()
            .chain([self.authentication_mode])
            .chain(self.signature_algorithm.to_le_bytes())
            .chain(self.public_key_algorithm.into_iter().flat_map(u16::to_le_bytes))
            .collect()
    }

    /// The authentication mode, if it is a known one.
    pub fn mode(&self) -> Option<AuthenticationMode> {
        AuthenticationMode::try_from(self.authentication_mode).ok()
    }

    /// The signature algorithm, if it is a known one.
    pub fn signature(&self) -> Option<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(self.signature_algorithm).ok()
    }

    /// The public key encoding, if present and known.
    pub fn public_key(&self) -> Option<PublicKeyEncoding> {
        self.public_key_algorithm
            .and_then(|alg| PublicKeyEncoding::try_from(alg).ok())
    }
}
