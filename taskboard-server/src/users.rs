//! Directory of active usernames.
//!
//! A username belongs to at most one live session. Claims are atomic
//! test-and-insert operations, and a claim lasts exactly as long as the
//! owning connection.

use crate::sessions::SessionId;
use crate::sync::Registry;

/// Why a username could not be claimed.
///
/// The `Display` text is sent to the client in `CONNECT_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The name is empty or whitespace only.
    #[error("username is blank")]
    Blank,
    /// Another active session holds the name.
    #[error("username already taken: {0}")]
    Taken(String),
}

/// Maps active usernames to the session that owns them.
#[derive(Debug, Default)]
pub struct UserDirectory {
    claims: Registry<String, SessionId>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `username` for `session`.
    ///
    /// Names are case-sensitive. Of several simultaneous claims for the
    /// same name exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Blank`] for blank names and
    /// [`ClaimError::Taken`] if the name is already active.
    pub fn claim(&self, username: &str, session: SessionId) -> Result<(), ClaimError> {
        self.claim_with(username, session, |_| {})
    }

    /// Like [`claim`](Self::claim), running `on_claim` inside the write
    /// section with the other active usernames, in sorted order.
    ///
    /// Joins and leaves are fully serialised by this section: nobody else
    /// can claim or release a name until `on_claim` returns.
    ///
    /// # Errors
    ///
    /// Same as [`claim`](Self::claim). `on_claim` does not run on error.
    pub fn claim_with(
        &self,
        username: &str,
        session: SessionId,
        on_claim: impl FnOnce(Vec<String>),
    ) -> Result<(), ClaimError> {
        if username.trim().is_empty() {
            return Err(ClaimError::Blank);
        }
        self.claims.write(|claims| {
            if claims.contains_key(username) {
                return Err(ClaimError::Taken(username.to_string()));
            }
            let others = claims.keys().cloned().collect();
            claims.insert(username.to_string(), session);
            on_claim(others);
            Ok(())
        })
    }

    /// Releases `username`. Releasing an unclaimed name is a no-op.
    ///
    /// Returns `true` if a claim was removed.
    pub fn release(&self, username: &str) -> bool {
        self.release_with(username, || {})
    }

    /// Like [`release`](Self::release), running `on_release` inside the
    /// write section if a claim was actually removed.
    pub fn release_with(&self, username: &str, on_release: impl FnOnce()) -> bool {
        self.claims.write(|claims| {
            if claims.remove(username).is_none() {
                return false;
            }
            on_release();
            true
        })
    }

    /// Returns the session that holds `username`, if any.
    #[must_use]
    pub fn owner(&self, username: &str) -> Option<SessionId> {
        self.claims.get(username)
    }

    /// Returns a sorted snapshot of active usernames.
    #[must_use]
    pub fn list_active(&self) -> Vec<String> {
        self.claims.keys_snapshot()
    }
}
