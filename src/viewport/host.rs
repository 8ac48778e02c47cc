use crate::models::BoundingBox;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Something that shows a map and knows which region is visible.
pub trait ViewportHost: Send + Sync {
    /// Visible bounds right now, or `None` if the map is not ready.
    fn current_bounds(&self) -> Option<BoundingBox>;

    /// Start listening for bounds changes. The listener is released when the
    /// returned subscription is dropped.
    fn subscribe(&self) -> ViewportSubscription;
}

/// In-process viewport host backed by a watch channel.
pub struct MapViewport {
    bounds: watch::Sender<Option<BoundingBox>>,
    listeners: Arc<AtomicUsize>,
}

impl MapViewport {
    /// A viewport with no bounds yet.
    pub fn new() -> Self {
        let (bounds, _) = watch::channel(None);
        Self {
            bounds,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A viewport that already shows `bbox`.
    pub fn with_bounds(bbox: BoundingBox) -> Self {
        let viewport = Self::new();
        viewport.set_bounds(bbox);
        viewport
    }

    /// Publish a new visible region.
    pub fn set_bounds(&self, bbox: BoundingBox) {
        self.bounds.send_replace(Some(bbox));
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportHost for MapViewport {
    fn current_bounds(&self) -> Option<BoundingBox> {
        *self.bounds.borrow()
    }

    fn subscribe(&self) -> ViewportSubscription {
        ViewportSubscription::new(self.bounds.subscribe(), self.listeners.clone())
    }
}

/// Scoped bounds-changed listener.
pub struct ViewportSubscription {
    receiver: watch::Receiver<Option<BoundingBox>>,
    listeners: Arc<AtomicUsize>,
}

impl ViewportSubscription {
    /// Wrap a receiver and count it as a live listener until dropped.
    pub fn new(receiver: watch::Receiver<Option<BoundingBox>>, listeners: Arc<AtomicUsize>) -> Self {
        listeners.fetch_add(1, Ordering::SeqCst);
        Self {
            receiver,
            listeners,
        }
    }

    /// Wait for the next published bounds. `None` once the host is gone.
    pub async fn changed(&mut self) -> Option<BoundingBox> {
        loop {
            if self.receiver.changed().await.is_err() {
                return None;
            }
            if let Some(bbox) = *self.receiver.borrow_and_update() {
                return Some(bbox);
            }
        }
    }
}

impl Drop for ViewportSubscription {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(10.0, 0.0, 10.0, 0.0).unwrap()
    }

    #[test]
    fn test_current_bounds() {
        let viewport = MapViewport::new();
        assert!(viewport.current_bounds().is_none());

        viewport.set_bounds(bbox());
        assert_eq!(viewport.current_bounds(), Some(bbox()));
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let viewport = MapViewport::new();
        let first = viewport.subscribe();
        let second = viewport.subscribe();
        assert_eq!(viewport.listener_count(), 2);

        drop(first);
        assert_eq!(viewport.listener_count(), 1);
        drop(second);
        assert_eq!(viewport.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_sees_only_new_bounds() {
        let viewport = MapViewport::with_bounds(bbox());
        let mut subscription = viewport.subscribe();

        let moved = BoundingBox::new(20.0, 0.0, 10.0, 0.0).unwrap();
        viewport.set_bounds(moved);
        assert_eq!(subscription.changed().await, Some(moved));
    }

    #[tokio::test]
    async fn test_subscription_ends_with_host() {
        let viewport = MapViewport::new();
        let mut subscription = viewport.subscribe();
        drop(viewport);
        assert_eq!(subscription.changed().await, None);
    }
}
