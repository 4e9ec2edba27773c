//! Per-element registries for host listeners and state observers.
//!
//! Both hand out snapshots (clones) so callers can run callbacks without
//! holding a borrow on the registry.

use std::rc::Rc;

use crate::host::Listener;
use crate::types::Value;

/// Observer callback: receives the watched keys' values, in watch order.
pub type ObserverFn = Rc<dyn Fn(&[Value])>;

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

/// Listeners currently attached to the bound node, in attach order.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<(String, Listener)>,
}

impl ListenerRegistry {
    /// Record a pair. Returns false if the exact pair is already recorded.
    pub fn insert(&mut self, event: &str, listener: Listener) -> bool {
        if self
            .entries
            .iter()
            .any(|(name, l)| name == event && *l == listener)
        {
            return false;
        }
        self.entries.push((event.to_string(), listener));
        true
    }

    /// Remove and return every listener recorded for `event`.
    pub fn take(&mut self, event: &str) -> Vec<Listener> {
        let mut removed = Vec::new();
        self.entries.retain(|(name, listener)| {
            if name == event {
                removed.push(listener.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn count(&self, event: &str) -> usize {
        self.entries.iter().filter(|(name, _)| name == event).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// OBSERVER REGISTRY
// =============================================================================

pub(crate) struct Observer {
    pub keys: Vec<String>,
    pub callback: ObserverFn,
}

/// State-change observers, in subscription order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Rc<Observer>>,
}

impl ObserverRegistry {
    pub fn push(&mut self, keys: Vec<String>, callback: ObserverFn) {
        self.observers.push(Rc::new(Observer { keys, callback }));
    }

    /// Observers registered so far. Ones added while the snapshot is being
    /// notified wait for the next mutation.
    pub fn snapshot(&self) -> Vec<Rc<Observer>> {
        self.observers.clone()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_exact_duplicate() {
        let mut registry = ListenerRegistry::default();
        let listener = Listener::new(|_| {});

        assert!(registry.insert("click", listener.clone()));
        assert!(!registry.insert("click", listener.clone()));
        assert!(registry.insert("change", listener));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_take_removes_by_event_name() {
        let mut registry = ListenerRegistry::default();
        let a = Listener::new(|_| {});
        let b = Listener::new(|_| {});
        let c = Listener::new(|_| {});

        registry.insert("click", a.clone());
        registry.insert("change", b);
        registry.insert("click", c.clone());

        let removed = registry.take("click");
        assert_eq!(removed, vec![a, c]);
        assert_eq!(registry.count("click"), 0);
        assert_eq!(registry.count("change"), 1);

        assert!(registry.take("click").is_empty());
    }

    #[test]
    fn test_observer_snapshot_order() {
        let mut registry = ObserverRegistry::default();
        registry.push(vec!["a".into()], Rc::new(|_| {}));
        registry.push(vec!["b".into(), "c".into()], Rc::new(|_| {}));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].keys, vec!["a".to_string()]);
        assert_eq!(snapshot[1].keys, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(registry.len(), 2);
    }
}
