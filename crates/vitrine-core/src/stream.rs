// ── Reactive state subscription ──
//
// Subscription handle for consuming state changes from a `CrudStore`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::CrudState;

/// A subscription to one view's state.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed`](Self::changed) or by converting into a `Stream`.
pub struct StateStream {
    current: Arc<CrudState>,
    receiver: watch::Receiver<Arc<CrudState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<CrudState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed`).
    pub fn current(&self) -> &Arc<CrudState> {
        &self.current
    }

    /// The latest snapshot.
    pub fn latest(&self) -> Arc<CrudState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<CrudState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot per store mutation.
pub struct StateWatchStream {
    inner: WatchStream<Arc<CrudState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<CrudState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;
    use crate::config::CrudConfig;
    use crate::model::Entity;
    use crate::store::CrudStore;

    fn store() -> CrudStore {
        let config = CrudConfig::new("Product", "Products", "products").with_search_fields(["name"]);
        CrudStore::new(Arc::new(config))
    }

    #[tokio::test]
    async fn stream_yields_current_snapshot_then_each_change() {
        let store = store();
        let mut stream = store.subscribe().into_stream();

        let first = stream.next().await.unwrap();
        assert!(first.items.is_empty());

        store.replace_items(vec![
            Entity::new("1").with("name", "Alpha"),
            Entity::new("2").with("name", "Bravo"),
        ]);
        let loaded = stream.next().await.unwrap();
        assert_eq!(loaded.pagination.total_count, 2);

        store.set_search_term("brav");
        let searched = stream.next().await.unwrap();
        assert_eq!(searched.search_term, "brav");
        assert_eq!(searched.filtered_items.len(), 1);
    }

    #[tokio::test]
    async fn stream_ends_when_store_is_dropped() {
        let store = store();
        let mut stream = store.subscribe().into_stream();
        assert!(stream.next().await.is_some());

        drop(store);
        assert!(stream.next().await.is_none());
    }
}
