use std::time::Duration;

use serde::{Deserialize, Serialize};
use uaf_types::protocol::Version;

/// Default application identifier placed in request headers.
pub const DEFAULT_APP_ID: &str = "https://localhost/fido/uaf/";

/// Default name of the policy document used for Reg and Auth requests.
pub const DEFAULT_POLICY_NAME: &str = "policy0";

/// Default advertised lifetime of issued requests.
pub const DEFAULT_REQUEST_LIFETIME: Duration = Duration::from_secs(60);

/// Settings of a [`UafServer`](crate::UafServer).
///
/// Every field has a default, so a partial JSON document deserializes into a usable config:
///
/// ```
/// # use uaf_server::ServerConfig;
/// let config: ServerConfig = serde_json::from_str(r#"{"appId":"https://example.com/uaf"}"#)?;
/// assert_eq!(config.policy_name, "policy0");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Application identifier sent in request headers and used to find the trusted facets.
    pub app_id: String,
    /// Name of the policy loaded for Reg and Auth requests.
    pub policy_name: String,
    /// How long a client may take to answer, reported as `lifetimeMillis`.
    #[serde(with = "millis")]
    pub request_lifetime: Duration,
    /// Protocol version pinned in headers and metadata lookups.
    pub upv: Version,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_owned(),
            policy_name: DEFAULT_POLICY_NAME.to_owned(),
            request_lifetime: DEFAULT_REQUEST_LIFETIME,
            upv: Version::UAF_1_1,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
