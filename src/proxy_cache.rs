use crate::remote_object::RemoteObject;

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

// Filled in once the proxy exists. Creation holds only this lock.
type Slot<P> = Arc<Mutex<Option<Arc<P>>>>;

/// Proxies keyed by the remote object they stand for.
///
/// Each identity has its own creation lock: concurrent requests for the same
/// identity materialise at most one proxy, while proxies for other
/// identities, including ones requested from inside a constructor, are
/// built independently. A constructor must not request its own identity.
#[derive(Debug)]
pub struct ProxyCache<P> {
    slots: Mutex<HashMap<RemoteObject, Slot<P>>>,
}

impl<P> Default for ProxyCache<P> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<P> ProxyCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RemoteObject) -> Option<Arc<P>> {
        let slot = self.slots.lock().get(key).cloned()?;
        let proxy = slot.lock().clone();
        proxy
    }

    /// Returns the cached proxy for `key`, or builds one with `create` and
    /// caches it. A failed `create` leaves the cache untouched.
    pub fn get_or_try_insert_with<F, E>(&self, key: RemoteObject, create: F) -> Result<Arc<P>, E>
    where
        F: FnOnce(&RemoteObject) -> Result<P, E>,
    {
        loop {
            let slot = self.slots.lock().entry(key.clone()).or_default().clone();
            let mut entry = slot.lock();
            if let Some(proxy) = entry.as_ref() {
                return Ok(proxy.clone());
            }
            // A failed creation or a `remove` may have dropped the slot while
            // this thread waited for it.
            if !self.holds(&key, &slot) {
                continue;
            }

            debug!("creating proxy for {}", key);
            return match create(&key) {
                Ok(proxy) => {
                    let proxy = Arc::new(proxy);
                    *entry = Some(proxy.clone());
                    Ok(proxy)
                }
                Err(err) => {
                    debug!("creating proxy for {} failed", key);
                    let mut slots = self.slots.lock();
                    if slots.get(&key).map_or(false, |held| Arc::ptr_eq(held, &slot)) {
                        slots.remove(&key);
                    }
                    Err(err)
                }
            };
        }
    }

    pub fn remove(&self, key: &RemoteObject) -> Option<Arc<P>> {
        let slot = self.slots.lock().remove(key)?;
        let proxy = slot.lock().take();
        proxy
    }

    pub fn len(&self) -> usize {
        self.filled().count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled().next().is_none()
    }

    pub fn clear(&self) {
        self.slots.lock().clear()
    }

    fn holds(&self, key: &RemoteObject, slot: &Slot<P>) -> bool {
        self.slots
            .lock()
            .get(key)
            .map_or(false, |held| Arc::ptr_eq(held, slot))
    }

    // Slot locks are never taken while the map lock is held.
    fn filled(&self) -> impl Iterator<Item = Slot<P>> {
        let slots: Vec<_> = self.slots.lock().values().cloned().collect();
        slots.into_iter().filter(|slot| slot.lock().is_some())
    }
}
