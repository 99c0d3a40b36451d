//! Name-keyed event queues.
//!
//! Events are not delivered: producers [`send`](Events::send) into a named
//! FIFO queue, consumers poll the queue's [`slice`](Events::slice) and decide
//! themselves when to [`clear`](Events::clear) it, typically at a frame
//! boundary. Queues are declared once, at world construction, as
//! `(name, event type)` pairs.
//!
//! The registry stores queues type-erased and downcasts on access, so a
//! `send` with the wrong payload type for a name reports `false` instead of
//! corrupting the queue.

use std::{any::Any, collections::HashMap};

/// Marker trait for event payload types.
pub trait Event: 'static + Send + Sync {}

/// Type-erased interface over one event queue.
trait ErasedQueue: 'static {
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// FIFO storage for a single event type.
struct Queue<E: Event> {
    events: Vec<E>,
}

impl<E: Event> ErasedQueue for Queue<E> {
    fn clear(&mut self) {
        self.events.clear();
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All event queues of a world, addressed by name.
#[derive(Default)]
pub struct Events {
    queues: HashMap<String, Box<dyn ErasedQueue>>,
}

impl Events {
    /// Create an empty event registry.
    pub(crate) fn new() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }

    /// Register a queue of `E` payloads under `name`.
    ///
    /// # Panics
    /// Panics if the name is already taken.
    pub(crate) fn register<E: Event>(&mut self, name: &str) {
        assert!(
            !self.queues.contains_key(name),
            "event queue already registered: {name}"
        );
        self.queues
            .insert(name.to_string(), Box::new(Queue::<E> { events: Vec::new() }));
    }

    /// Whether a queue with this name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    /// Append an event to the named queue. Returns `false` when the name is
    /// unknown or the queue holds a different payload type.
    pub fn send<E: Event>(&mut self, name: &str, event: E) -> bool {
        let Some(queue) = self.queues.get_mut(name) else {
            return false;
        };
        let Some(queue) = queue.as_any_mut().downcast_mut::<Queue<E>>() else {
            return false;
        };
        queue.events.push(event);
        true
    }

    /// Get the current contents of the named queue, in send order. Returns
    /// `None` when the name is unknown or the payload type does not match.
    pub fn slice<E: Event>(&self, name: &str) -> Option<&[E]> {
        let queue = self.queues.get(name)?;
        let queue = queue.as_any().downcast_ref::<Queue<E>>()?;
        Some(&queue.events)
    }

    /// Number of pending events in the named queue, or 0 for unknown names.
    #[inline]
    pub fn len(&self, name: &str) -> usize {
        self.queues.get(name).map_or(0, |queue| queue.len())
    }

    /// Truncate the named queue. Returns `false` for unknown names.
    pub fn clear(&mut self, name: &str) -> bool {
        let Some(queue) = self.queues.get_mut(name) else {
            return false;
        };
        queue.clear();
        true
    }

    /// Truncate every queue.
    pub fn clear_all(&mut self) {
        for queue in self.queues.values_mut() {
            queue.clear();
        }
    }
}
