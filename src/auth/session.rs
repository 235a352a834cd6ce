//! Session identity and verification freshness.
//!
//! The session owns the bearer credential and the user-profile snapshot as
//! one replace-wholesale value, plus the freshness window that decides when
//! a cached verification can be trusted without a network round trip.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::UserProfile;
use crate::storage::{KeyValueStorage, TOKEN_KEY, USER_KEY};

/// A (timestamp, TTL) pair gating a cached value.
///
/// A value is usable iff `now - stamped_at < ttl`. An unstamped window is
/// never fresh, which forces a remote round trip on first access.
#[derive(Debug, Clone)]
pub struct FreshnessWindow {
    pub(crate) stamped_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl FreshnessWindow {
    pub fn new(ttl: Duration) -> Self {
        Self {
            stamped_at: None,
            ttl,
        }
    }

    /// Mark the cached value as freshly obtained.
    pub fn stamp(&mut self) {
        self.stamped_at = Some(Utc::now());
    }

    /// Invalidate the window, forcing a round trip on next access.
    pub fn reset(&mut self) {
        self.stamped_at = None;
    }

    pub fn is_fresh(&self) -> bool {
        match self.stamped_at {
            Some(at) => Utc::now() - at < self.ttl,
            None => false,
        }
    }
}

/// The authenticated principal: bearer token plus profile snapshot.
/// Never merged - always replaced wholesale, cleared wholesale.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub token: String,
    pub user: UserProfile,
}

/// Holds the current identity (if any) and its verification freshness.
pub struct Session {
    identity: Option<SessionIdentity>,
    pub(crate) freshness: FreshnessWindow,
}

impl Session {
    pub fn new(identity_ttl: Duration) -> Self {
        Self {
            identity: None,
            freshness: FreshnessWindow::new(identity_ttl),
        }
    }

    /// Restore a persisted identity from storage. The freshness window is
    /// left unstamped: a restored credential must be verified before it is
    /// trusted as fresh.
    pub fn restore(&mut self, storage: &dyn KeyValueStorage) {
        let token = match storage.get(TOKEN_KEY) {
            Some(token) if !token.is_empty() => token,
            _ => return,
        };
        let user = storage
            .get(USER_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    debug!(error = %e, "Discarding unparseable persisted profile");
                    None
                }
            })
            .unwrap_or_default();

        self.identity = Some(SessionIdentity { token, user });
    }

    /// Replace the identity wholesale, stamp the window, persist.
    pub fn replace(&mut self, identity: SessionIdentity, storage: &mut dyn KeyValueStorage) {
        storage.set(TOKEN_KEY, &identity.token);
        match serde_json::to_string(&identity.user) {
            Ok(raw) => storage.set(USER_KEY, &raw),
            Err(e) => debug!(error = %e, "Failed to serialize profile for storage"),
        }
        self.identity = Some(identity);
        self.freshness.stamp();
    }

    /// Update just the profile snapshot (verify returns a profile but no new
    /// token) and stamp the window.
    pub fn refresh_user(&mut self, user: UserProfile, storage: &mut dyn KeyValueStorage) {
        if let Some(ref mut identity) = self.identity {
            match serde_json::to_string(&user) {
                Ok(raw) => storage.set(USER_KEY, &raw),
                Err(e) => debug!(error = %e, "Failed to serialize profile for storage"),
            }
            identity.user = user;
        }
        self.freshness.stamp();
    }

    /// Destroy the identity and its persisted copy.
    pub fn clear(&mut self, storage: &mut dyn KeyValueStorage) {
        self.identity = None;
        self.freshness.reset();
        storage.remove(TOKEN_KEY);
        storage.remove(USER_KEY);
    }

    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.identity.as_ref().map(|i| &i.user)
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// True when the cached identity can be returned without re-verifying.
    pub fn is_fresh(&self) -> bool {
        self.identity.is_some() && self.freshness.is_fresh()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn identity(token: &str) -> SessionIdentity {
        SessionIdentity {
            token: token.to_string(),
            user: UserProfile {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            },
        }
    }

    #[test]
    fn unstamped_window_is_never_fresh() {
        let window = FreshnessWindow::new(Duration::minutes(5));
        assert!(!window.is_fresh());
    }

    #[test]
    fn window_expires_after_ttl() {
        let mut window = FreshnessWindow::new(Duration::minutes(5));
        window.stamp();
        assert!(window.is_fresh());
        window.stamped_at = Some(Utc::now() - Duration::minutes(6));
        assert!(!window.is_fresh());
    }

    #[test]
    fn replace_persists_and_stamps() {
        let mut storage = MemoryStorage::new();
        let mut session = Session::new(Duration::minutes(5));
        session.replace(identity("tok-1"), &mut storage);

        assert!(session.is_fresh());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        assert!(storage.get(USER_KEY).is_some());
    }

    #[test]
    fn restore_is_not_fresh_until_verified() {
        let mut storage = MemoryStorage::new();
        let mut session = Session::new(Duration::minutes(5));
        session.replace(identity("tok-1"), &mut storage);

        let mut restored = Session::new(Duration::minutes(5));
        restored.restore(&storage);
        assert!(restored.is_logged_in());
        assert_eq!(restored.token(), Some("tok-1"));
        assert!(!restored.is_fresh());
        assert_eq!(restored.user().unwrap().first_name, "Ada");
    }

    #[test]
    fn clear_removes_identity_and_persisted_keys() {
        let mut storage = MemoryStorage::new();
        let mut session = Session::new(Duration::minutes(5));
        session.replace(identity("tok-1"), &mut storage);
        session.clear(&mut storage);

        assert!(!session.is_logged_in());
        assert!(!session.is_fresh());
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert_eq!(storage.get(USER_KEY), None);
    }

    #[test]
    fn restore_with_corrupt_profile_defaults_it() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-1");
        storage.set(USER_KEY, "{not json");

        let mut session = Session::new(Duration::minutes(5));
        session.restore(&storage);
        assert!(session.is_logged_in());
        assert_eq!(session.user().unwrap().email, "");
    }
}
