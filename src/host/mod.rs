//! Host Module - The boundary between elements and the node tree they drive.
//!
//! An element only needs a handful of things from its host:
//! - resolve a node by selector ([`Document::query_selector`])
//! - add/remove a named event listener on that node
//! - read/write the node's content, and its value for input-like nodes
//!
//! Any host that implements [`Node`] and [`Document`] works. The in-memory
//! host in [`memory`] follows browser listener semantics and is what the
//! scoreboard and the terminal bridge run on.
//!
//! # Example
//!
//! ```ignore
//! use reactive_element::host::{Listener, MemoryDocument, MemoryNode};
//!
//! let doc = MemoryDocument::new();
//! let button = doc.append(MemoryNode::new("button").with_class("reset"));
//!
//! let listener = Listener::new(|event| println!("{} fired", event.name));
//! button.add_event_listener("click", &listener);
//! doc.dispatch(".reset", "click");
//! ```

pub mod memory;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub use memory::{MemoryDocument, MemoryNode};

// =============================================================================
// NODE FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Capabilities of a host node.
    ///
    /// Writes to a capability the node lacks are ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Accepts markup written through `set_content`.
        const CONTENT = 1 << 0;
        /// Input-like: carries a user-editable value.
        const VALUE = 1 << 1;
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name (e.g. "click", "change")
    pub name: String,
    /// The target's value at dispatch time (input-like nodes only)
    pub value: Option<String>,
}

impl Event {
    /// Create an event with no target value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Create an event carrying the target's value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

thread_local! {
    static NEXT_LISTENER_ID: Cell<usize> = const { Cell::new(0) };
}

fn next_listener_id() -> usize {
    NEXT_LISTENER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// An event handler with identity.
///
/// Clones share the same id, so any clone can remove a registration made
/// with another. Two listeners built from the same closure are distinct.
#[derive(Clone)]
pub struct Listener {
    id: usize,
    handler: Rc<dyn Fn(&Event)>,
}

impl Listener {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        Self {
            id: next_listener_id(),
            handler: Rc::new(handler),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Invoke the handler.
    pub fn call(&self, event: &Event) {
        (self.handler)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

// =============================================================================
// NODE / DOCUMENT
// =============================================================================

/// A host node an element can bind to.
pub trait Node {
    fn flags(&self) -> NodeFlags;

    /// Current content (markup).
    fn content(&self) -> String;

    /// Replace the content verbatim.
    fn set_content(&self, markup: &str);

    /// Current value; `None` unless the node is input-like.
    fn value(&self) -> Option<String>;

    fn set_value(&self, value: &str);

    /// Register `listener` for `event`. Registering the same pair twice is a no-op.
    fn add_event_listener(&self, event: &str, listener: &Listener);

    /// Unregister the exact `(event, listener)` pair. No-op when absent.
    fn remove_event_listener(&self, event: &str, listener: &Listener);
}

/// Shared handle to a host node.
pub type NodeRef = Rc<dyn Node>;

/// Node lookup.
pub trait Document {
    /// First node matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<NodeRef>;
}

/// What an element binds to: a selector resolved through a [`Document`],
/// or a node reference passed directly.
#[derive(Clone)]
pub enum Target {
    Selector(String),
    Node(NodeRef),
}

impl Target {
    /// Resolve to a node. `None` when a selector matches nothing.
    pub fn resolve(&self, document: &dyn Document) -> Option<NodeRef> {
        match self {
            Target::Selector(selector) => document.query_selector(selector),
            Target::Node(node) => Some(node.clone()),
        }
    }

    /// Human-readable description for errors and logs.
    pub fn describe(&self) -> String {
        match self {
            Target::Selector(selector) => selector.clone(),
            Target::Node(_) => "<node>".to_string(),
        }
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<NodeRef> for Target {
    fn from(node: NodeRef) -> Self {
        Target::Node(node)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            Target::Node(_) => f.write_str("Node(..)"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
