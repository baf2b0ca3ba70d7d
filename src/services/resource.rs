//! Load-once latch for page-lifetime resources (payment widget, map library).

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

/// Holds a resource that is loaded at most once successfully. Concurrent
/// callers wait on the same load; a failed load is not cached, so the next
/// caller tries again.
#[derive(Debug)]
pub struct LoadOnce<T> {
    name: &'static str,
    cell: OnceCell<T>,
    attempts: AtomicUsize,
}

impl<T> LoadOnce<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, cell: OnceCell::new(), attempts: AtomicUsize::new(0) }
    }

    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.cell
            .get_or_try_init(|| async move {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(resource = self.name, attempt, "loading resource");
                let loaded = load().await;
                match &loaded {
                    Ok(_) => tracing::info!(resource = self.name, "resource loaded"),
                    Err(e) => tracing::warn!(resource = self.name, attempt, error = %e, "resource load failed"),
                }
                loaded
            })
            .await
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times the loader has actually run.
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_loads_once() {
        let latch = LoadOnce::new("map");
        for _ in 0..3 {
            let value = latch.get_or_load(|| async { Ok::<_, String>(7) }).await.unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(latch.load_attempts(), 1);
        assert!(latch.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let latch: LoadOnce<u8> = LoadOnce::new("widget");
        let first = latch.get_or_load(|| async { Err::<u8, _>("offline".to_string()) }).await;
        assert!(first.is_err());
        assert!(!latch.is_loaded());
        let second = latch.get_or_load(|| async { Ok::<_, String>(1) }).await.unwrap();
        assert_eq!(*second, 1);
        assert_eq!(latch.load_attempts(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let latch = Arc::new(LoadOnce::new("widget"));
        let mut handles = vec![];
        for _ in 0..8 {
            let latch = Arc::clone(&latch);
            handles.push(tokio::spawn(async move {
                *latch
                    .get_or_load(|| async {
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        Ok::<_, String>(42u32)
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(latch.load_attempts(), 1);
    }
}
