//! Periodic scroll-offset capture for the open chapter

use super::ProgressStore;
use crate::service::RenderSurface;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Background task saving the surface's scroll offset every
/// `autosave_interval`. Bound to one chapter; dropping it stops the timer.
pub struct Autosave {
    chapter_key: String,
    handle: JoinHandle<()>,
}

impl Autosave {
    /// Start the timer. Must be called inside a tokio runtime.
    pub fn spawn(
        store: ProgressStore,
        surface: Arc<dyn RenderSurface>,
        book_id: impl Into<String>,
        chapter_key: impl Into<String>,
    ) -> Self {
        let book_id = book_id.into();
        let chapter_key = chapter_key.into();
        let period = store
            .config()
            .autosave_interval()
            .max(Duration::from_millis(1));

        let task_key = chapter_key.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let offset = surface.current_scroll_offset();
                store.save_scroll_offset(&book_id, &task_key, offset).await;
            }
        });

        debug!(chapter_key = %chapter_key, ?period, "autosave started");
        Self {
            chapter_key,
            handle,
        }
    }

    /// Chapter this timer writes offsets for
    pub fn chapter_key(&self) -> &str {
        &self.chapter_key
    }

    /// Stop the timer
    pub fn cancel(self) {}
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(chapter_key = %self.chapter_key, "autosave stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{KeyValueCache, MemoryBookmarks, MemoryCache, SessionContext};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FixedSurface {
        offset: AtomicU32,
    }

    impl RenderSurface for FixedSurface {
        fn render_html(&self, _document: &str, _base_url: &str) {}

        fn current_scroll_offset(&self) -> u32 {
            self.offset.load(Ordering::SeqCst)
        }

        fn scroll_to(&self, offset: u32) {
            self.offset.store(offset, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_on_interval_until_cancelled() {
        let cache = Arc::new(MemoryCache::new());
        let store = ProgressStore::new(
            SessionContext::new("u1"),
            Arc::new(MemoryBookmarks::new()),
            cache.clone(),
        );
        let surface = Arc::new(FixedSurface::default());
        surface.scroll_to(150);

        let autosave = Autosave::spawn(store, surface.clone(), "b1", "c1");
        assert_eq!(autosave.chapter_key(), "c1");

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(cache.get("b1_c1").await.unwrap(), None);

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(cache.get("b1_c1").await.unwrap().as_deref(), Some("150"));

        surface.scroll_to(900);
        autosave.cancel();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(cache.get("b1_c1").await.unwrap().as_deref(), Some("150"));
    }
}
