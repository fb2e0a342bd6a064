//! UI-owning execution context.
//!
//! OS callbacks (hotkey listener thread, input monitors, tray events, config
//! watcher) never touch panel state directly. They `post` onto a
//! [`UiSender`], which enqueues the event and pokes a waker; the waker
//! schedules a drain of the [`UiQueue`] on the main thread, where every
//! event is handled in order.

use std::sync::Arc;

use async_channel::{Receiver, Sender, TryRecvError};

/// Schedules a queue drain on the UI context. Called from any thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct UiSender<E> {
    tx: Sender<E>,
    waker: Waker,
}

impl<E> Clone for UiSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<E> UiSender<E> {
    /// Enqueue `event` and wake the UI context. Returns `false` once the
    /// queue has been dropped.
    pub fn post(&self, event: E) -> bool {
        if self.tx.try_send(event).is_err() {
            tracing::debug!("UI queue closed, event dropped");
            return false;
        }
        (self.waker)();
        true
    }
}

pub struct UiQueue<E> {
    rx: Receiver<E>,
}

impl<E> UiQueue<E> {
    pub fn try_next(&self) -> Option<E> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    /// Handle every queued event, including ones posted while draining.
    pub fn drain(&self, mut handle: impl FnMut(E)) -> usize {
        let mut handled = 0;
        while let Some(event) = self.try_next() {
            handle(event);
            handled += 1;
        }
        handled
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Unbounded queue whose sender wakes the UI context on every post.
pub fn ui_channel<E>(waker: Waker) -> (UiSender<E>, UiQueue<E>) {
    let (tx, rx) = async_channel::unbounded();
    (UiSender { tx, waker }, UiQueue { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_waker() -> (Waker, Arc<AtomicUsize>) {
        let wakes = Arc::new(AtomicUsize::new(0));
        let w = wakes.clone();
        (
            Arc::new(move || {
                w.fetch_add(1, Ordering::SeqCst);
            }),
            wakes,
        )
    }

    #[test]
    fn test_post_wakes_and_drain_preserves_order() {
        let (waker, wakes) = counting_waker();
        let (tx, queue) = ui_channel::<u32>(waker);

        assert!(tx.post(1));
        assert!(tx.clone().post(2));
        assert_eq!(wakes.load(Ordering::SeqCst), 2);

        let mut seen = Vec::new();
        assert_eq!(queue.drain(|e| seen.push(e)), 2);
        assert_eq!(seen, vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_events_posted_while_draining_are_handled() {
        let (waker, _) = counting_waker();
        let (tx, queue) = ui_channel::<u32>(waker);
        tx.post(1);

        let mut seen = Vec::new();
        queue.drain(|e| {
            if e == 1 {
                tx.post(2);
            }
            seen.push(e);
        });
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_post_from_other_thread() {
        let (waker, wakes) = counting_waker();
        let (tx, queue) = ui_channel::<&'static str>(waker);
        let handle = std::thread::spawn(move || tx.post("hotkey"));
        assert!(handle.join().unwrap());
        assert_eq!(queue.try_next(), Some("hotkey"));
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_post_after_queue_dropped_returns_false() {
        let (waker, wakes) = counting_waker();
        let (tx, queue) = ui_channel::<u32>(waker);
        drop(queue);
        assert!(!tx.post(1));
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }
}
