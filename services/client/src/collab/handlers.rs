//! services/client/src/collab/handlers.rs

use super::protocol::{CollabEvent, EventKind};
use std::collections::HashMap;
use tracing::debug;

type Handler = Box<dyn Fn(&CollabEvent) + Send + Sync>;

/// Event handlers keyed by event kind. Several handlers may share a kind;
/// they run in registration order.
#[derive(Default)]
pub struct HandlerMap {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&CollabEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    /// Registers `handler` for every kind.
    pub fn on_any<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&CollabEvent) + Send + Sync + Clone + 'static,
    {
        for kind in EventKind::ALL {
            self.on(kind, handler.clone());
        }
        self
    }

    /// Runs the handlers for the event's kind; returns how many ran.
    pub fn dispatch(&self, event: &CollabEvent) -> usize {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            debug!("No handler for {:?} event.", event.kind());
            return 0;
        };
        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispatch_routes_by_kind() {
        let edits = Arc::new(AtomicUsize::new(0));
        let saves = Arc::new(AtomicUsize::new(0));
        let mut map = HandlerMap::new();
        {
            let edits = edits.clone();
            map.on(EventKind::Edit, move |_| {
                edits.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let saves = saves.clone();
            map.on(EventKind::Save, move |_| {
                saves.fetch_add(1, Ordering::SeqCst);
            });
        }

        let edit = CollabEvent::Edit {
            content: "x".into(),
            user: "a".into(),
        };
        assert_eq!(map.dispatch(&edit), 1);
        assert_eq!(map.dispatch(&CollabEvent::Share { user: "a".into() }), 0);
        assert_eq!(edits.load(Ordering::SeqCst), 1);
        assert_eq!(saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn on_any_sees_every_kind() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut map = HandlerMap::new();
        let counter = seen.clone();
        map.on_any(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        map.dispatch(&CollabEvent::Save { user: "a".into() });
        map.dispatch(&CollabEvent::Share { user: "a".into() });
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
