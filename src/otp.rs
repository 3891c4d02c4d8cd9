// src/otp.rs

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

/// Which flow an OTP belongs to. Signup and password-reset codes live in
/// separate namespaces so one can never be replayed against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

/// A stored OTP as seen by callers. Expired entries are never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub code: String,
    /// Set once /verify-otp succeeded; signup requires it.
    pub verified: bool,
}

/// Time-bounded key-value store for one-time codes, injected into the auth
/// handlers as a collaborator. Implementations own expiry.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores a fresh, unverified code for the email, replacing any
    /// previous one in the same namespace.
    async fn put(&self, purpose: OtpPurpose, email: &str, code: String);

    /// Looks up the live entry for the email, if any.
    async fn get(&self, purpose: OtpPurpose, email: &str) -> Option<OtpEntry>;

    /// Flags the entry as verified. Returns false when no live entry
    /// exists.
    async fn mark_verified(&self, purpose: OtpPurpose, email: &str) -> bool;

    /// Drops the entry, e.g. after the code was consumed.
    async fn remove(&self, purpose: OtpPurpose, email: &str);
}

/// Generates a 6-digit numeric code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

struct StoredOtp {
    code: String,
    verified: bool,
    expires_at: Instant,
}

/// Process-local `OtpStore` with per-entry TTL. Entries are dropped lazily
/// on access, so the map never grows past the set of recently requested
/// codes.
pub struct InMemoryOtpStore {
    ttl: Duration,
    entries: RwLock<HashMap<(OtpPurpose, String), StoredOtp>>,
}

impl InMemoryOtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, purpose: OtpPurpose, email: &str, code: String) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, v| v.expires_at > Instant::now());
        entries.insert(
            (purpose, email.to_string()),
            StoredOtp {
                code,
                verified: false,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    async fn get(&self, purpose: OtpPurpose, email: &str) -> Option<OtpEntry> {
        let entries = self.entries.read().await;
        let stored = entries.get(&(purpose, email.to_string()))?;
        if stored.expires_at <= Instant::now() {
            return None;
        }
        Some(OtpEntry {
            code: stored.code.clone(),
            verified: stored.verified,
        })
    }

    async fn mark_verified(&self, purpose: OtpPurpose, email: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&(purpose, email.to_string())) {
            Some(stored) if stored.expires_at > Instant::now() => {
                stored.verified = true;
                true
            }
            _ => false,
        }
    }

    async fn remove(&self, purpose: OtpPurpose, email: &str) {
        self.entries
            .write()
            .await
            .remove(&(purpose, email.to_string()));
    }
}
