//! Remote credentials.

use std::fmt;

/// A bearer credential plus the account identity it belongs to.
///
/// Supplied by the auth layer and passed through to the remote store;
/// the sync layer never persists it. The absence of either field
/// suspends all sync activity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token.
    pub token: String,
    /// Email of the signed-in account.
    pub user_email: String,
}

impl Credential {
    /// Creates a new credential.
    pub fn new(token: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_email: user_email.into(),
        }
    }

    /// Returns true if both token and identity are present.
    pub fn is_usable(&self) -> bool {
        !self.token.is_empty() && !self.user_email.is_empty()
    }
}

// The token must not leak into logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("user_email", &self.user_email)
            .finish()
    }
}
