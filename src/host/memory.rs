//! In-memory host - A tiny node tree with browser-style listener semantics.
//!
//! - Selectors: `tag`, `.class`, `#id`, and compounds like `tag.class`
//! - First match wins, in insertion order
//! - Listeners run in registration order; duplicates are ignored
//! - A listener removed while an event is being dispatched does not run
//!   for the rest of that dispatch

use std::cell::RefCell;
use std::rc::Rc;

use super::{Document, Event, Listener, Node, NodeFlags, NodeRef};

// =============================================================================
// MEMORY NODE
// =============================================================================

/// A host node held in memory.
#[derive(Debug)]
pub struct MemoryNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    flags: NodeFlags,
    content: RefCell<String>,
    value: RefCell<String>,
    listeners: RefCell<Vec<(String, Listener)>>,
}

impl MemoryNode {
    /// Create a content node (div, span, button...).
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_flags(tag, NodeFlags::CONTENT)
    }

    /// Create an input-like node. It carries a value and ignores content writes.
    pub fn input() -> Self {
        Self::with_flags("input", NodeFlags::VALUE)
    }

    pub fn with_flags(tag: impl Into<String>, flags: NodeFlags) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            flags,
            content: RefCell::new(String::new()),
            value: RefCell::new(String::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Build a node that `selector` matches. `default_tag` is used when the
    /// selector names no tag. `None` for selectors [`matches`](Self::matches)
    /// cannot parse.
    pub fn from_selector(selector: &str, default_tag: &str, flags: NodeFlags) -> Option<Self> {
        let parts = parse_selector(selector)?;

        let tag = parts
            .iter()
            .find_map(|part| match part {
                SelectorPart::Tag(tag) => Some(tag.as_str()),
                _ => None,
            })
            .unwrap_or(default_tag);

        let mut node = Self::with_flags(tag, flags);
        for part in parts {
            match part {
                SelectorPart::Tag(_) => {}
                SelectorPart::Class(class) => node = node.with_class(class),
                SelectorPart::Id(id) => node = node.with_id(id),
            }
        }
        Some(node)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Builder-style initial value (input-like nodes only).
    pub fn with_value(self, value: impl Into<String>) -> Self {
        if self.flags.contains(NodeFlags::VALUE) {
            *self.value.borrow_mut() = value.into();
        }
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Check whether this node matches a simple compound selector.
    pub fn matches(&self, selector: &str) -> bool {
        let Some(parts) = parse_selector(selector) else {
            return false;
        };

        parts.iter().all(|part| match part {
            SelectorPart::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
            SelectorPart::Class(class) => self.classes.iter().any(|c| c == class),
            SelectorPart::Id(id) => self.id.as_deref() == Some(id.as_str()),
        })
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Fire `event` on this node. Returns how many listeners ran.
    pub fn dispatch(&self, event: &str) -> usize {
        let event = Event {
            name: event.to_string(),
            value: self.value(),
        };

        // Snapshot so handlers may add/remove listeners while we iterate
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, listener)| listener.clone())
            .collect();

        let mut invoked = 0;
        for listener in snapshot {
            if !self.is_registered(&event.name, &listener) {
                continue;
            }
            listener.call(&event);
            invoked += 1;
        }
        invoked
    }

    fn is_registered(&self, event: &str, listener: &Listener) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|(name, l)| name == event && l == listener)
    }
}

impl Node for MemoryNode {
    fn flags(&self) -> NodeFlags {
        self.flags
    }

    fn content(&self) -> String {
        self.content.borrow().clone()
    }

    fn set_content(&self, markup: &str) {
        if self.flags.contains(NodeFlags::CONTENT) {
            *self.content.borrow_mut() = markup.to_string();
        }
    }

    fn value(&self) -> Option<String> {
        self.flags
            .contains(NodeFlags::VALUE)
            .then(|| self.value.borrow().clone())
    }

    fn set_value(&self, value: &str) {
        if self.flags.contains(NodeFlags::VALUE) {
            *self.value.borrow_mut() = value.to_string();
        }
    }

    fn add_event_listener(&self, event: &str, listener: &Listener) {
        if self.is_registered(event, listener) {
            return;
        }
        self.listeners
            .borrow_mut()
            .push((event.to_string(), listener.clone()));
    }

    fn remove_event_listener(&self, event: &str, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .retain(|(name, l)| !(name == event && l == listener));
    }
}

// =============================================================================
// SELECTORS
// =============================================================================

#[derive(Debug, PartialEq)]
enum SelectorPart {
    Tag(String),
    Class(String),
    Id(String),
}

/// Parse `tag`, `.class`, `#id` and their compounds. `None` for anything else.
fn parse_selector(selector: &str) -> Option<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    let mut kind = None::<char>;
    let mut current = String::new();

    let mut flush = |kind: Option<char>, name: &mut String| -> Option<()> {
        if name.is_empty() {
            // A bare prefix like "." or "#" is malformed; an empty leading tag is fine
            return if kind.is_none() { Some(()) } else { None };
        }
        let name = std::mem::take(name);
        parts.push(match kind {
            None => SelectorPart::Tag(name),
            Some('.') => SelectorPart::Class(name),
            Some(_) => SelectorPart::Id(name),
        });
        Some(())
    };

    for ch in selector.chars() {
        match ch {
            '.' | '#' => {
                flush(kind, &mut current)?;
                kind = Some(ch);
            }
            c if c.is_alphanumeric() || c == '-' || c == '_' => current.push(c),
            _ => return None,
        }
    }
    flush(kind, &mut current)?;

    Some(parts)
}

// =============================================================================
// MEMORY DOCUMENT
// =============================================================================

/// A flat list of [`MemoryNode`]s with selector lookup.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<Rc<MemoryNode>>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return a handle to it.
    pub fn append(&self, node: MemoryNode) -> Rc<MemoryNode> {
        let node = Rc::new(node);
        self.nodes.borrow_mut().push(node.clone());
        node
    }

    /// Concrete handle to the first node matching `selector`.
    pub fn find(&self, selector: &str) -> Option<Rc<MemoryNode>> {
        self.nodes
            .borrow()
            .iter()
            .find(|node| node.matches(selector))
            .cloned()
    }

    /// Fire `event` on the first node matching `selector`.
    /// Returns how many listeners ran (0 when nothing matches).
    pub fn dispatch(&self, selector: &str, event: &str) -> usize {
        match self.find(selector) {
            Some(node) => node.dispatch(event),
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }
}

impl Document for MemoryDocument {
    fn query_selector(&self, selector: &str) -> Option<NodeRef> {
        self.find(selector).map(|node| node as NodeRef)
    }
}

// =============================================================================
// TESTS
// =============================================================================
