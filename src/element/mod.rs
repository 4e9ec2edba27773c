//! Element - State bound to a host node, a render function and listeners.
//!
//! An element owns:
//! - `state` (a [`Signal`] over [`State`]) and the snapshot it started from
//! - the bound node it renders into and attaches listeners to
//! - the listeners currently attached, so they can be detached by event name
//! - observers that run on every mutation with the values of their watched keys
//!
//! # Mutation order
//!
//! `mutate` merges the updater's partial result into the state, notifies
//! observers, then renders. `reset_state` restores the initial snapshot and
//! renders without notifying anyone.
//!
//! # Re-entrancy
//!
//! Observers and listeners may call back into any element, including the one
//! that is notifying. No registry borrow is held while a callback runs.
//! Nested mutations render in call-stack order: the inner render happens
//! first and the outer render, which reads the latest state, happens last.
//! Observers read the state as it is when they run, so an observer that runs
//! after a nested mutation sees the nested values.
//!
//! # Example
//!
//! ```ignore
//! use reactive_element::{element, ElementProps, MemoryDocument, MemoryNode, State};
//!
//! let doc = MemoryDocument::new();
//! doc.append(MemoryNode::new("div").with_class("count"));
//!
//! let count = element(
//!     &doc,
//!     ".count",
//!     ElementProps::stateful(State::from([("n", 0)]), |s| format!("Count: {}", s.value_of("n"))),
//! )?;
//!
//! count.subscribe(["n"], |values| println!("n is now {}", values[0]));
//! count.mutate(|s| State::from([("n", s.get_int("n").unwrap_or(0) + 1)]));
//! ```

mod registry;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{debug, warn};

pub use registry::ObserverFn;
use registry::{ListenerRegistry, ObserverRegistry};

use crate::error::{BindingError, ElementError};
use crate::host::{Document, Event, Listener, NodeRef, Target};
use crate::types::{State, Value};

/// Render function: state in, markup out. Must be pure.
pub type RenderFn = Rc<dyn Fn(&State) -> String>;

// =============================================================================
// PROPS
// =============================================================================

/// Construction options.
///
/// With no initial state the element is a bare listener wrapper: it renders
/// nothing and ignores `mutate` / `reset_state`.
#[derive(Clone, Default)]
pub struct ElementProps {
    pub initial_state: Option<State>,
    pub render: Option<RenderFn>,
}

impl ElementProps {
    /// Props for a bare element (listeners only).
    pub fn bare() -> Self {
        Self::default()
    }

    /// Props for an element with managed state and a renderer.
    pub fn stateful<F>(initial_state: State, render: F) -> Self
    where
        F: Fn(&State) -> String + 'static,
    {
        Self {
            initial_state: Some(initial_state),
            render: Some(Rc::new(render)),
        }
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

struct Inner {
    node: NodeRef,
    label: String,
    initial_state: Option<State>,
    state: Signal<State>,
    render: Option<RenderFn>,
    listeners: RefCell<ListenerRegistry>,
    observers: RefCell<ObserverRegistry>,
}

/// Shared handle to a reactive element. Clones refer to the same element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<Inner>,
}

/// Create an element bound to `target`, resolved through `document`.
///
/// Fails with [`BindingError`] when the selector matches nothing, and with
/// [`ElementError::MissingRender`] when an initial state comes without a
/// renderer. With an initial state the node is rendered immediately.
pub fn element(
    document: &dyn Document,
    target: impl Into<Target>,
    props: ElementProps,
) -> Result<Element, ElementError> {
    let target = target.into();
    let node = target
        .resolve(document)
        .ok_or_else(|| BindingError::new(target.describe()))?;
    Element::build(node, target.describe(), props)
}

impl Element {
    /// Create an element bound directly to `node`.
    pub fn from_node(node: NodeRef, props: ElementProps) -> Result<Self, ElementError> {
        Self::build(node, "<node>".to_string(), props)
    }

    fn build(node: NodeRef, label: String, props: ElementProps) -> Result<Self, ElementError> {
        if props.initial_state.is_some() && props.render.is_none() {
            return Err(ElementError::MissingRender);
        }

        let state = signal(props.initial_state.clone().unwrap_or_default());
        let element = Self {
            inner: Rc::new(Inner {
                node,
                label,
                initial_state: props.initial_state,
                state,
                render: props.render,
                listeners: RefCell::new(ListenerRegistry::default()),
                observers: RefCell::new(ObserverRegistry::default()),
            }),
        };

        if element.is_managed() {
            element.reset_state();
        }

        debug!(element = %element.inner.label, managed = element.is_managed(), "element created");
        Ok(element)
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Merge `updater(&state)` into the state, notify observers, re-render.
    ///
    /// Keys in the partial overwrite, keys absent from it are kept, keys not
    /// yet in the state are added.
    pub fn mutate<F>(&self, updater: F)
    where
        F: FnOnce(&State) -> State,
    {
        if !self.is_managed() {
            warn!(element = %self.inner.label, "mutate ignored on element without managed state");
            return;
        }

        let mut next = self.inner.state.get();
        let partial = updater(&next);
        debug!(element = %self.inner.label, keys = partial.len(), "mutate");
        next.merge(partial);
        self.inner.state.set(next);

        self.notify();
        self.render();
    }

    /// Restore a fresh copy of the initial state and render.
    /// Observers are not notified.
    pub fn reset_state(&self) {
        let Some(initial) = &self.inner.initial_state else {
            warn!(element = %self.inner.label, "reset ignored on element without managed state");
            return;
        };

        self.inner.state.set(initial.clone());
        self.render();
    }

    /// Run `callback` on every future `mutate` with the values of `keys`,
    /// in the order given. Missing keys are reported as [`Value::Null`].
    pub fn subscribe<I, K, F>(&self, keys: I, callback: F)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(&[Value]) + 'static,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.inner
            .observers
            .borrow_mut()
            .push(keys, Rc::new(callback));
    }

    fn notify(&self) {
        let observers = self.inner.observers.borrow().snapshot();
        for observer in observers {
            let values = self.inner.state.get().pick(&observer.keys);
            (observer.callback)(&values);
        }
    }

    fn render(&self) {
        if let Some(render) = &self.inner.render {
            let markup = render(&self.inner.state.get());
            self.inner.node.set_content(&markup);
        }
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Attach `handler` for `event` on the bound node.
    pub fn attach_listener<F>(&self, event: &str, handler: F) -> &Self
    where
        F: Fn(&Event) + 'static,
    {
        self.attach(event, Listener::new(handler))
    }

    /// Attach an existing listener. Attaching the same pair twice is a no-op.
    pub fn attach(&self, event: &str, listener: Listener) -> &Self {
        let inserted = self
            .inner
            .listeners
            .borrow_mut()
            .insert(event, listener.clone());

        if inserted {
            self.inner.node.add_event_listener(event, &listener);
            debug!(element = %self.inner.label, event, listener = listener.id(), "listener attached");
        }
        self
    }

    /// Detach every listener attached for `event`. No-op when there are none.
    pub fn detach_listener(&self, event: &str) -> &Self {
        let removed = self.inner.listeners.borrow_mut().take(event);
        for listener in &removed {
            self.inner.node.remove_event_listener(event, listener);
        }
        if !removed.is_empty() {
            debug!(element = %self.inner.label, event, count = removed.len(), "listeners detached");
        }
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current state. Tracked when read inside a derived or effect.
    pub fn state(&self) -> State {
        self.inner.state.get()
    }

    /// The signal backing the state.
    pub fn state_signal(&self) -> Signal<State> {
        self.inner.state.clone()
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.inner.initial_state.as_ref()
    }

    /// The bound node.
    pub fn node(&self) -> NodeRef {
        self.inner.node.clone()
    }

    /// Whether this element manages state (was given an initial state).
    pub fn is_managed(&self) -> bool {
        self.inner.initial_state.is_some()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.borrow().count(event)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("target", &self.inner.label)
            .field("state", &self.inner.state.get())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("observers", &self.observer_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryDocument, MemoryNode, Node};
    use std::cell::Cell;

    fn score_markup(state: &State) -> String {
        format!("{} to {}", state.value_of("playerOne"), state.value_of("playerTwo"))
    }

    fn setup() -> (MemoryDocument, Rc<MemoryNode>, Element) {
        let doc = MemoryDocument::new();
        let node = doc.append(MemoryNode::new("div").with_class("score"));
        let score = element(
            &doc,
            ".score",
            ElementProps::stateful(State::from([("playerOne", 0), ("playerTwo", 0)]), score_markup),
        )
        .unwrap();
        (doc, node, score)
    }

    fn increment(key: &'static str) -> impl FnOnce(&State) -> State {
        move |state: &State| State::from([(key, state.get_int(key).unwrap_or(0) + 1)])
    }

    #[test]
    fn test_initial_render() {
        let (_doc, node, score) = setup();
        assert_eq!(node.content(), "0 to 0");
        assert!(score.is_managed());
    }

    #[test]
    fn test_merge_semantics() {
        let (_doc, _node, score) = setup();

        score.mutate(|_| State::from([("playerTwo", 3)]));
        let state = score.state();
        assert_eq!(state.get_int("playerOne"), Some(0));
        assert_eq!(state.get_int("playerTwo"), Some(3));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_new_keys_are_allowed() {
        let (_doc, _node, score) = setup();

        score.mutate(|_| State::new().with("winner", "playerOne"));
        assert_eq!(score.state().value_of("winner"), Value::from("playerOne"));
        assert_eq!(score.state().len(), 3);
    }

    #[test]
    fn test_render_after_mutate() {
        let (_doc, node, score) = setup();

        score.mutate(increment("playerOne"));
        assert_eq!(node.content(), score_markup(&score.state()));
        assert_eq!(node.content(), "1 to 0");
    }

    #[test]
    fn test_observer_order_and_values() {
        let (_doc, _node, score) = setup();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let calls_a = calls.clone();
        score.subscribe(["playerOne"], move |values| {
            calls_a.borrow_mut().push(("a", values.to_vec()));
        });
        let calls_b = calls.clone();
        score.subscribe(["playerTwo", "playerOne"], move |values| {
            calls_b.borrow_mut().push(("b", values.to_vec()));
        });

        score.mutate(increment("playerOne"));

        assert_eq!(
            *calls.borrow(),
            vec![
                ("a", vec![Value::Int(1)]),
                ("b", vec![Value::Int(0), Value::Int(1)]),
            ]
        );
    }

    #[test]
    fn test_observers_run_before_render() {
        let (_doc, node, score) = setup();
        let seen = Rc::new(RefCell::new(String::new()));

        let seen_clone = seen.clone();
        let node_clone = node.clone();
        score.subscribe(["playerOne"], move |_| {
            *seen_clone.borrow_mut() = node_clone.content();
        });

        score.mutate(increment("playerOne"));
        assert_eq!(*seen.borrow(), "0 to 0");
        assert_eq!(node.content(), "1 to 0");
    }

    #[test]
    fn test_missing_watched_key_is_null() {
        let (_doc, _node, score) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        score.subscribe(["nope"], move |values| seen_clone.borrow_mut().extend_from_slice(values));
        score.mutate(increment("playerOne"));

        assert_eq!(*seen.borrow(), vec![Value::Null]);
    }

    #[test]
    fn test_four_increments_scenario() {
        let (_doc, node, score) = setup();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let calls_clone = calls.clone();
        score.subscribe(["playerOne", "playerTwo"], move |values| {
            calls_clone
                .borrow_mut()
                .push((values[0].as_int().unwrap(), values[1].as_int().unwrap()));
        });

        for _ in 0..4 {
            score.mutate(increment("playerOne"));
        }

        assert_eq!(score.state().get_int("playerOne"), Some(4));
        assert_eq!(*calls.borrow(), vec![(1, 0), (2, 0), (3, 0), (4, 0)]);
        assert_eq!(node.content(), "4 to 0");
    }

    #[test]
    fn test_reset_purity() {
        let (_doc, node, score) = setup();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        score.subscribe(["playerOne", "playerTwo"], move |_| count_clone.set(count_clone.get() + 1));

        score.mutate(increment("playerOne"));
        score.mutate(increment("playerTwo"));
        score.mutate(|_| State::new().with("extra", true));
        assert_eq!(count.get(), 3);

        score.reset_state();

        assert_eq!(count.get(), 3);
        assert_eq!(score.state(), State::from([("playerOne", 0), ("playerTwo", 0)]));
        assert_eq!(node.content(), "0 to 0");
        assert_eq!(score.initial_state(), Some(&State::from([("playerOne", 0), ("playerTwo", 0)])));
    }

    #[test]
    fn test_detach_exactness() {
        let doc = MemoryDocument::new();
        let node = doc.append(MemoryNode::new("button").with_class("player-one"));
        let button = element(&doc, ".player-one", ElementProps::bare()).unwrap();

        let count = Rc::new(Cell::new(0));
        let h1 = count.clone();
        let h2 = count.clone();
        button
            .attach_listener("click", move |_| h1.set(h1.get() + 1))
            .attach_listener("click", move |_| h2.set(h2.get() + 10));

        doc.dispatch(".player-one", "click");
        assert_eq!(count.get(), 11);

        button.detach_listener("click");
        doc.dispatch(".player-one", "click");
        assert_eq!(count.get(), 11);
        assert_eq!(node.listener_count("click"), 0);
        assert_eq!(button.listener_count("click"), 0);
    }

    #[test]
    fn test_detach_only_named_event() {
        let doc = MemoryDocument::new();
        let node = doc.append(MemoryNode::input());
        let input = element(&doc, "input", ElementProps::bare()).unwrap();

        input
            .attach_listener("change", |_| {})
            .attach_listener("focus", |_| {});
        input.detach_listener("change").detach_listener("never-attached");

        assert_eq!(node.listener_count("change"), 0);
        assert_eq!(node.listener_count("focus"), 1);
        assert_eq!(input.listener_count("focus"), 1);
    }

    #[test]
    fn test_attach_same_listener_twice() {
        let doc = MemoryDocument::new();
        let node = doc.append(MemoryNode::new("button"));
        let button = element(&doc, "button", ElementProps::bare()).unwrap();

        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let listener = Listener::new(move |_| count_clone.set(count_clone.get() + 1));

        button.attach("click", listener.clone()).attach("click", listener);
        assert_eq!(button.listener_count("click"), 1);

        node.dispatch("click");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_binding_error() {
        let doc = MemoryDocument::new();
        let err = element(&doc, ".missing", ElementProps::bare()).unwrap_err();
        assert_eq!(err, ElementError::Binding(BindingError::new(".missing")));
        assert_eq!(err.to_string(), "no node matches selector `.missing`");
    }

    #[test]
    fn test_missing_render_rejected() {
        let node: NodeRef = Rc::new(MemoryNode::new("div"));
        let props = ElementProps {
            initial_state: Some(State::new()),
            render: None,
        };
        assert_eq!(Element::from_node(node, props).unwrap_err(), ElementError::MissingRender);
    }

    #[test]
    fn test_from_node() {
        let node = Rc::new(MemoryNode::new("div"));
        let el = Element::from_node(
            node.clone(),
            ElementProps::stateful(State::from([("playTo", 5)]), |s| {
                format!("Playing to {}", s.value_of("playTo"))
            }),
        )
        .unwrap();

        assert_eq!(node.content(), "Playing to 5");
        el.mutate(|_| State::from([("playTo", 7)]));
        assert_eq!(node.content(), "Playing to 7");
    }

    #[test]
    fn test_bare_element_ignores_state_ops() {
        let doc = MemoryDocument::new();
        let node = doc.append(MemoryNode::new("button"));
        node.set_content("Reset");
        let button = element(&doc, "button", ElementProps::bare()).unwrap();

        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        button.subscribe(["x"], move |_| count_clone.set(count_clone.get() + 1));

        button.mutate(|_| State::from([("x", 1)]));
        button.reset_state();

        assert!(!button.is_managed());
        assert!(button.state().is_empty());
        assert_eq!(count.get(), 0);
        assert_eq!(node.content(), "Reset");
    }

    #[test]
    fn test_reentrant_mutation_from_observer() {
        let (_doc, node, score) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));

        // Clamp playerOne back to 2 whenever it passes 2
        let score_clone = score.clone();
        score.subscribe(["playerOne"], move |values| {
            if values[0].as_int().unwrap_or(0) > 2 {
                score_clone.mutate(|_| State::from([("playerOne", 2)]));
            }
        });
        let seen_clone = seen.clone();
        score.subscribe(["playerOne"], move |values| {
            seen_clone.borrow_mut().push(values[0].clone());
        });

        for _ in 0..3 {
            score.mutate(increment("playerOne"));
        }

        assert_eq!(score.state().get_int("playerOne"), Some(2));
        assert_eq!(node.content(), "2 to 0");
        // Third mutation: the nested clamp notifies first, then the outer
        // notification sees the clamped value too
        assert_eq!(
            *seen.borrow(),
            vec![Value::Int(1), Value::Int(2), Value::Int(2), Value::Int(2)]
        );
    }

    #[test]
    fn test_listener_detaching_from_inside_handler() {
        let doc = MemoryDocument::new();
        doc.append(MemoryNode::new("button"));
        let button = element(&doc, "button", ElementProps::bare()).unwrap();

        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let button_clone = button.clone();
        button.attach_listener("click", move |_| {
            count_clone.set(count_clone.get() + 1);
            button_clone.detach_listener("click");
        });

        doc.dispatch("button", "click");
        doc.dispatch("button", "click");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_state_reads_are_tracked() {
        use spark_signals::derived;

        let (_doc, _node, score) = setup();
        let score_clone = score.clone();
        let total = derived(move || {
            let state = score_clone.state();
            state.get_int("playerOne").unwrap_or(0) + state.get_int("playerTwo").unwrap_or(0)
        });

        assert_eq!(total.get(), 0);
        score.mutate(increment("playerOne"));
        score.mutate(increment("playerTwo"));
        assert_eq!(total.get(), 2);

        score.reset_state();
        assert_eq!(total.get(), 0);
    }
}
