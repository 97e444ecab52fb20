use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A helper lazily built on first use and owned by one provider.
///
/// Construction happens under a lock, so concurrent first callers build it
/// once. `invalidate` drops the cached value; providers call it on
/// deactivation and whenever the data it derives from changes.
#[derive(Debug)]
pub struct OwnedResource<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for OwnedResource<T> {
    fn default() -> Self {
        Self { slot: Mutex::new(None) }
    }
}

impl<T> OwnedResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, building it with `init` if absent. A failed
    /// `init` leaves the slot empty.
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init().await?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub async fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().await.clone()
    }

    /// Drop the cached value and return it.
    pub async fn invalidate(&self) -> Option<Arc<T>> {
        self.slot.lock().await.take()
    }

    pub async fn is_initialized(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_builds_once() {
        let resource = Arc::new(OwnedResource::<usize>::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let resource = Arc::clone(&resource);
            let builds = Arc::clone(&builds);
            tasks.push(tokio::spawn(async move {
                resource
                    .get_or_try_init(|| async {
                        builds.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, ()>(7)
                    })
                    .await
            }));
        }
        for task in tasks {
            assert_eq!(*task.await.unwrap().unwrap(), 7);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_rebuild() {
        let resource = OwnedResource::new();
        let first = resource.get_or_try_init(|| async { Ok::<_, ()>(1) }).await.unwrap();
        assert_eq!(*first, 1);
        assert!(resource.invalidate().await.is_some());
        assert!(!resource.is_initialized().await);
        let second = resource.get_or_try_init(|| async { Ok::<_, ()>(2) }).await.unwrap();
        assert_eq!(*second, 2);
    }

    #[tokio::test]
    async fn failed_init_leaves_slot_empty() {
        let resource: OwnedResource<u8> = OwnedResource::new();
        let result = resource.get_or_try_init(|| async { Err("unreachable backend") }).await;
        assert_eq!(result.unwrap_err(), "unreachable backend");
        assert!(resource.get().await.is_none());
    }
}
