//! Ephemeral share registry
//!
//! Maps share identifiers to uploaded bundles for the lifetime of the
//! process. Every operation takes the same lock, so a read racing a sweep
//! observes either the whole bundle or its absence.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    error::{RegistryError, RegistryResult},
    share::{NewShare, ShareBundle, ShareId},
};

/// Resource caps for the registry
#[derive(Debug, Clone)]
pub struct RegistryLimits {
    /// Maximum number of stored bundles, live or not yet swept
    pub max_entries: usize,
    /// Maximum encoded size of a single bundle's payloads, in bytes
    pub max_bundle_bytes: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            // 100 MiB of raw uploads after base64 expansion
            max_bundle_bytes: 140 * 1024 * 1024,
        }
    }
}

/// Share registry handle. Clones share the same underlying map.
#[derive(Clone)]
pub struct ShareRegistry {
    limits: RegistryLimits,
    clock: Arc<dyn Clock>,
    entries: Arc<Mutex<HashMap<ShareId, Arc<ShareBundle>>>>,
}

impl fmt::Debug for ShareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareRegistry")
            .field("limits", &self.limits)
            .field("clock", &"<dyn Clock>")
            .finish()
    }
}

impl ShareRegistry {
    /// Create an empty registry on the wall clock
    pub fn new(limits: RegistryLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Create an empty registry driven by `clock`
    pub fn with_clock(limits: RegistryLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a new bundle and return its identifier.
    ///
    /// The identifier is readable through [`ShareRegistry::get`] until
    /// `now + expiry.ttl()`.
    pub async fn create(&self, share: NewShare) -> RegistryResult<ShareId> {
        validate(&share)?;

        let size = share.encoded_len();
        if size > self.limits.max_bundle_bytes {
            warn!(
                size,
                limit = self.limits.max_bundle_bytes,
                "Rejected share above size limit"
            );
            return Err(RegistryError::PayloadTooLarge {
                size,
                limit: self.limits.max_bundle_bytes,
            });
        }

        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        if entries.len() >= self.limits.max_entries {
            let before = entries.len();
            entries.retain(|_, bundle| !bundle.is_expired_at(now));
            let removed = before - entries.len();
            if removed > 0 {
                info!(removed, "Pruned expired shares to make room");
            }
            if entries.len() >= self.limits.max_entries {
                warn!(entries = entries.len(), "Registry full, rejecting share");
                return Err(RegistryError::CapacityExceeded(self.limits.max_entries));
            }
        }

        let mut id = ShareId::generate();
        while entries.contains_key(&id) {
            id = ShareId::generate();
        }

        let NewShare {
            payloads,
            filenames,
            expiry,
            has_password,
        } = share;
        let files = payloads.len();
        let bundle = ShareBundle {
            id,
            payloads,
            filenames,
            created_at: now,
            expires_at: now + expiry.ttl(),
            has_password,
        };
        let expires_at = bundle.expires_at;
        entries.insert(id, Arc::new(bundle));

        info!(share_id = %id, files, size, %expiry, %expires_at, "Created share");
        Ok(id)
    }

    /// Look up a bundle, refusing to hand out one whose expiry has passed
    pub async fn get(&self, id: &ShareId) -> RegistryResult<Arc<ShareBundle>> {
        let entries = self.entries.lock().await;
        let bundle = entries.get(id).ok_or(RegistryError::NotFound)?;

        if bundle.is_expired_at(self.clock.now()) {
            debug!(share_id = %id, "Share requested after expiry");
            return Err(RegistryError::Expired);
        }

        Ok(Arc::clone(bundle))
    }

    /// Remove every bundle whose expiry lies strictly in the past.
    /// Returns the number of removed entries.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let removed = remove_expired(&mut entries, self.clock.now());
        debug!(removed, remaining = entries.len(), "Swept share registry");
        removed
    }

    /// Number of stored bundles, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

fn validate(share: &NewShare) -> RegistryResult<()> {
    if share.payloads.is_empty() {
        return Err(RegistryError::InvalidInput(
            "at least one file is required".to_string(),
        ));
    }
    if share.payloads.len() != share.filenames.len() {
        return Err(RegistryError::InvalidInput(format!(
            "{} payloads but {} filenames",
            share.payloads.len(),
            share.filenames.len()
        )));
    }
    Ok(())
}

fn remove_expired(entries: &mut HashMap<ShareId, Arc<ShareBundle>>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, bundle| bundle.expires_at >= now);
    before - entries.len()
}
