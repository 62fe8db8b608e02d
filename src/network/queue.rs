use super::NetEvent;
use ringbuffer::{AllocRingBuffer, RingBuffer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Hand-off between the receive thread and the control loop.
///
/// Pushing never blocks: when full, the oldest pending event is dropped and
/// counted.
#[derive(Clone)]
pub struct EventQueue {
    events: Arc<Mutex<AllocRingBuffer<NetEvent>>>,
    dropped: Arc<AtomicUsize>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(EVENT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(AllocRingBuffer::new(capacity))),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn push(&self, event: NetEvent) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.is_full() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(dropped_total = total, "event queue full, dropping oldest event");
        }
        let _ = events.enqueue(event);
    }

    /// Takes every pending event, oldest first.
    pub fn drain(&self) -> Vec<NetEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::iter::from_fn(|| events.dequeue()).collect()
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// A session callback that feeds this queue.
    pub fn callback(&self) -> impl Fn(NetEvent) + Send + Sync + 'static {
        let queue = self.clone();
        move |event| queue.push(event)
    }
}
