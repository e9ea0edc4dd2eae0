//! Local preview handles for selected photos.
//!
//! A handle is acquired when a photo is selected and released when it is
//! dropped, which happens when the slot is replaced or the owning state is
//! torn down. The registry keeps the books so leaks and double releases are
//! visible.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifier of a preview handle.
pub type PreviewId = u64;

#[derive(Debug, Default)]
struct Ledger {
    live: BTreeMap<PreviewId, String>,
    releases: BTreeMap<PreviewId, usize>,
    double_releases: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    ledger: Mutex<Ledger>,
}

impl RegistryInner {
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self, id: PreviewId) {
        let mut ledger = self.ledger();
        *ledger.releases.entry(id).or_insert(0) += 1;
        match ledger.live.remove(&id) {
            Some(url) => tracing::debug!(id, %url, "released preview"),
            None => {
                ledger.double_releases += 1;
                tracing::error!(id, "preview released twice");
            }
        }
    }
}

/// Hands out preview handles and tracks which are still live.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a preview for a selected file.
    pub fn acquire(&self, file_name: &str) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("preview://{id}/{file_name}");
        self.inner.ledger().live.insert(id, url.clone());
        tracing::debug!(id, %url, "acquired preview");
        PreviewHandle {
            id,
            url,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Number of previews acquired and not yet released.
    pub fn live_count(&self) -> usize {
        self.inner.ledger().live.len()
    }

    /// Returns true if the preview is still live.
    pub fn is_live(&self, id: PreviewId) -> bool {
        self.inner.ledger().live.contains_key(&id)
    }

    /// How many times the preview has been released.
    pub fn release_count(&self, id: PreviewId) -> usize {
        self.inner.ledger().releases.get(&id).copied().unwrap_or(0)
    }

    /// Releases of previews that were no longer live.
    pub fn double_releases(&self) -> usize {
        self.inner.ledger().double_releases
    }
}

/// A live preview reference; released exactly once, on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    id: PreviewId,
    url: String,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    /// Registry identifier.
    pub fn id(&self) -> PreviewId {
        self.id
    }

    /// Displayable reference to the preview.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_drop() {
        let registry = PreviewRegistry::new();
        let handle = registry.acquire("kid.jpg");
        let id = handle.id();
        assert!(handle.url().ends_with("/kid.jpg"));
        assert!(registry.is_live(id));
        assert_eq!(registry.live_count(), 1);

        drop(handle);
        assert!(!registry.is_live(id));
        assert_eq!(registry.release_count(id), 1);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.double_releases(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = PreviewRegistry::new();
        let a = registry.acquire("a.png");
        let b = registry.acquire("a.png");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.url(), b.url());
    }

    #[test]
    fn test_release_of_dead_id_is_counted() {
        let registry = PreviewRegistry::new();
        let handle = registry.acquire("a.png");
        let id = handle.id();
        drop(handle);
        registry.inner.release(id);
        assert_eq!(registry.release_count(id), 2);
        assert_eq!(registry.double_releases(), 1);
    }
}
