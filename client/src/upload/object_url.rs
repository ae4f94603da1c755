use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

type Entries = Arc<Mutex<HashMap<Uuid, Arc<Vec<u8>>>>>;

// In-process stand-in for a browser blob store: staged bytes addressable by URL
// until revoked.
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    entries: Entries,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Arc<Vec<u8>>) -> ObjectUrl {
        let id = Uuid::new_v4();
        lock(&self.entries).insert(id, bytes);
        log::debug!("Created object URL {}", id);
        ObjectUrl(Arc::new(Handle {
            id,
            entries: self.entries.clone(),
        }))
    }

    pub fn revoke(&self, url: &ObjectUrl) {
        url.revoke();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Handle {
    id: Uuid,
    entries: Entries,
}

impl Drop for Handle {
    fn drop(&mut self) {
        lock(&self.entries).remove(&self.id);
    }
}

// Cloning shares the address; the bytes are released when the last clone drops
// or on an explicit revoke, whichever comes first.
#[derive(Clone)]
pub struct ObjectUrl(Arc<Handle>);

impl ObjectUrl {
    pub fn resolve(&self) -> Option<Arc<Vec<u8>>> {
        lock(&self.0.entries).get(&self.0.id).cloned()
    }

    pub fn is_live(&self) -> bool {
        lock(&self.0.entries).contains_key(&self.0.id)
    }

    pub fn revoke(&self) {
        if lock(&self.0.entries).remove(&self.0.id).is_some() {
            log::debug!("Revoked object URL {}", self.0.id);
        }
    }
}

impl PartialEq for ObjectUrl {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:local/{}", self.0.id)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.0.id).finish()
    }
}

fn lock(entries: &Entries) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<Vec<u8>>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
