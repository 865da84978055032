// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::ViewHandle;
use crate::error::fatal;

/// Concurrent mapping from native view handles to their windows.
///
/// The registry does not own the native views; entries live from the native
/// "view created" callback until "terminate".
pub struct WindowRegistry<W> {
    views: Mutex<HashMap<ViewHandle, Arc<W>>>,
}

impl<W> WindowRegistry<W> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Maps `view` to `window`, replacing any previous entry.
    pub fn insert(&self, view: ViewHandle, window: Arc<W>) {
        log::trace!("registry insert {}", view);
        self.views.lock().unwrap().insert(view, window);
    }

    /// Returns the window of `view`, if registered.
    pub fn lookup(&self, view: ViewHandle) -> Option<Arc<W>> {
        self.views.lock().unwrap().get(&view).cloned()
    }

    /// Removes `view`. Removing an unknown view does nothing.
    pub fn delete(&self, view: ViewHandle) {
        log::trace!("registry delete {}", view);
        self.views.lock().unwrap().remove(&view);
    }

    /// Like [lookup](Self::lookup), but a missing view is fatal.
    #[track_caller]
    pub fn must(&self, view: ViewHandle) -> Arc<W> {
        match self.lookup(view) {
            Some(window) => window,
            None => fatal(&format!("no window for {view}")),
        }
    }

    /// Number of registered views.
    pub fn len(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    /// Whether no view is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<W> Default for WindowRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_insert_lookup_delete() {
        let registry = WindowRegistry::new();
        let view = ViewHandle(7);
        registry.insert(view, Arc::new("main"));
        assert_eq!(registry.lookup(view).as_deref(), Some(&"main"));

        registry.delete(view);
        assert!(registry.lookup(view).is_none());
        assert!(registry.is_empty());

        // Deleting again is a no-op.
        registry.delete(view);
    }

    #[test]
    fn test_last_write_wins() {
        let registry = WindowRegistry::new();
        registry.insert(ViewHandle(1), Arc::new(1));
        registry.insert(ViewHandle(1), Arc::new(2));
        assert_eq!(*registry.must(ViewHandle(1)), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "no window for")]
    fn test_must_panics_for_unknown_view() {
        let registry: WindowRegistry<u32> = WindowRegistry::new();
        registry.must(ViewHandle(99));
    }

    #[test]
    fn test_concurrent_insert_then_lookup() {
        let registry = Arc::new(WindowRegistry::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for i in 0..100u64 {
                        let view = ViewHandle(t * 1000 + i);
                        let window = Arc::new(view.0);
                        registry.insert(view, window.clone());
                        let found = registry.lookup(view).expect("just inserted");
                        assert!(Arc::ptr_eq(&found, &window));
                        registry.delete(view);
                        assert!(registry.lookup(view).is_none());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
