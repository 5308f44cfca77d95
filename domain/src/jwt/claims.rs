use serde::{Deserialize, Serialize};

/// Claims embedded in a session access credential at mint time.
///
/// Verification trusts only the signature and the `exp` check; nothing here
/// is re-read from the user store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Email address asserted by the identity provider at mint time.
    pub email: String,
    /// Display name asserted by the identity provider, when present.
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}
