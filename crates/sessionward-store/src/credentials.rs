//! Session credentials and the fail-safe store that persists them.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::Storage;

/// Storage key of the long-lived renewal token.
pub const RENEWAL_TOKEN_KEY: &str = "refreshToken";

/// Storage key of the short-lived credential's expiry (epoch milliseconds,
/// as a decimal string).
pub const EXPIRY_KEY: &str = "accessTokenExpiresAt";

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What the client needs to keep a session alive across restarts.
///
/// The renewal token and the expiry always travel together: there is no
/// way to hold one without the other, so "session present" is simply
/// `Option<Credentials>::is_some()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Opaque long-lived token, exchanged for fresh short-lived credentials.
    pub renewal_token: String,

    /// When the short-lived credential stops working, in epoch milliseconds.
    pub expires_at_ms: u64,
}

impl Credentials {
    /// Credentials for a grant issued at `now_ms`, valid for
    /// `expires_in_secs` seconds.
    pub fn issued(renewal_token: impl Into<String>, expires_in_secs: u64, now_ms: u64) -> Self {
        Self {
            renewal_token: renewal_token.into(),
            expires_at_ms: now_ms.saturating_add(expires_in_secs.saturating_mul(1000)),
        }
    }

    /// Whole seconds left until expiry, negative once expired.
    ///
    /// Rounds toward negative infinity, so 500 ms left is 0 seconds and
    /// 500 ms past expiry is -1.
    pub fn remaining_secs(&self, now_ms: u64) -> i64 {
        let delta = self.expires_at_ms as i128 - now_ms as i128;
        delta.div_euclid(1000) as i64
    }
}

/// Reads and writes [`Credentials`] through a [`Storage`] backend without
/// ever failing.
///
/// Storage errors are logged at `warn` and otherwise ignored: a failed
/// `save` means the next process start has no session, a failed `load`
/// looks like "no session", a failed `clear` leaves stale entries that
/// the next renewal attempt will reject.
#[derive(Debug)]
pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    /// Wraps a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persists both entries. Each entry is an overwrite, never a merge.
    pub fn save(&self, credentials: &Credentials) {
        let expiry = credentials.expires_at_ms.to_string();
        let result = self
            .storage
            .set(RENEWAL_TOKEN_KEY, &credentials.renewal_token)
            .and_then(|()| self.storage.set(EXPIRY_KEY, &expiry));

        match result {
            Ok(()) => tracing::trace!(expires_at_ms = credentials.expires_at_ms, "credentials saved"),
            Err(e) => tracing::warn!(error = %e, "could not persist session credentials"),
        }
    }

    /// Reads the persisted credentials.
    ///
    /// A missing renewal token means "no session", whatever the expiry
    /// entry says. A token with a missing or unparsable expiry is kept
    /// and reported as already expired, so the caller renews it at once.
    pub fn load(&self) -> Option<Credentials> {
        let token = match self.storage.get(RENEWAL_TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session credentials");
                return None;
            }
        };

        let expires_at_ms = match self.storage.get(EXPIRY_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::debug!(%raw, "unparsable credential expiry; treating as expired");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "could not read credential expiry; treating as expired");
                0
            }
        };

        Some(Credentials {
            renewal_token: token,
            expires_at_ms,
        })
    }

    /// Removes both entries.
    pub fn clear(&self) {
        let result = self
            .storage
            .remove(RENEWAL_TOKEN_KEY)
            .and_then(|()| self.storage.remove(EXPIRY_KEY));

        if let Err(e) = result {
            tracing::warn!(error = %e, "could not clear session credentials");
        }
    }

    /// `true` if a renewal token is persisted right now.
    pub fn has_session(&self) -> bool {
        self.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, StoreError};

    /// A backend that fails every call, like storage disabled by a
    /// privacy mode or a full disk.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
    }

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::new())
    }

    #[test]
    fn test_issued_adds_lifetime_to_now() {
        let creds = Credentials::issued("r1", 3600, 1_000);
        assert_eq!(creds.expires_at_ms, 3_601_000);
    }

    #[test]
    fn test_remaining_secs_floors_toward_past() {
        let creds = Credentials {
            renewal_token: "r".into(),
            expires_at_ms: 10_000,
        };
        assert_eq!(creds.remaining_secs(0), 10);
        assert_eq!(creds.remaining_secs(9_500), 0);
        assert_eq!(creds.remaining_secs(10_500), -1);
        assert_eq!(creds.remaining_secs(70_000), -60);
    }

    #[test]
    fn test_save_then_load_returns_same_credentials() {
        let store = store();
        let creds = Credentials::issued("r1", 60, 5_000);

        store.save(&creds);

        assert_eq!(store.load(), Some(creds));
    }

    #[test]
    fn test_save_writes_expiry_as_millisecond_string() {
        let store = store();
        store.save(&Credentials::issued("r1", 1, 0));

        assert_eq!(
            store.storage().get(EXPIRY_KEY).unwrap().as_deref(),
            Some("1000")
        );
    }

    #[test]
    fn test_load_without_token_is_none_even_with_expiry() {
        let store = store();
        store.storage().set(EXPIRY_KEY, "99999999999999").unwrap();

        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_token_without_expiry_is_already_expired() {
        let store = store();
        store.storage().set(RENEWAL_TOKEN_KEY, "r1").unwrap();

        let creds = store.load().expect("token alone still counts as a session");
        assert_eq!(creds.expires_at_ms, 0);
        assert!(creds.remaining_secs(now_millis()) < 0);
    }

    #[test]
    fn test_load_garbage_expiry_is_already_expired() {
        let store = store();
        store.storage().set(RENEWAL_TOKEN_KEY, "r1").unwrap();
        store.storage().set(EXPIRY_KEY, "tomorrow").unwrap();

        assert_eq!(store.load().map(|c| c.expires_at_ms), Some(0));
    }

    #[test]
    fn test_clear_removes_both_entries() {
        let store = store();
        store.save(&Credentials::issued("r1", 60, 0));

        store.clear();

        assert!(store.storage().is_empty());
        assert!(!store.has_session());
    }

    #[test]
    fn test_save_overwrites_previous_token() {
        let store = store();
        store.save(&Credentials::issued("r1", 60, 0));
        store.save(&Credentials::issued("r2", 120, 0));

        let creds = store.load().unwrap();
        assert_eq!(creds.renewal_token, "r2");
        assert_eq!(creds.expires_at_ms, 120_000);
    }

    #[test]
    fn test_broken_storage_never_panics_or_errors() {
        let store = SessionStore::new(BrokenStorage);

        store.save(&Credentials::issued("r1", 60, 0));
        assert_eq!(store.load(), None);
        store.clear();
        assert!(!store.has_session());
    }
}
