//! # reactive-element
//!
//! Minimal reactive UI primitive for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for state.
//!
//! ## Architecture
//!
//! An [`Element`] binds a piece of state to one host node, a render function
//! and a set of event listeners:
//!
//! ```text
//! mutate(updater) → merge partial → notify observers → render into node
//! reset_state()   → restore initial snapshot        → render into node
//! ```
//!
//! There is no component tree and no diffing. Applications create several
//! independent elements and coordinate them with closures that capture
//! element handles; [`scoreboard`] is such an application.
//!
//! ## Modules
//!
//! - [`types`] - State values (`Value`, `State`)
//! - [`host`] - Host boundary (`Node`, `Document`, listeners) and the in-memory host
//! - [`element`] - The reactive element
//! - [`scoreboard`] - Two-player scorekeeper built from elements
//! - [`terminal`] - crossterm driver for the scoreboard

pub mod element;
pub mod error;
pub mod host;
pub mod scoreboard;
pub mod terminal;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{BindingError, ElementError};

pub use element::{element, Element, ElementProps, ObserverFn, RenderFn};

pub use host::{
    Document, Event, Listener, MemoryDocument, MemoryNode, Node, NodeFlags, NodeRef, Target,
};

pub use scoreboard::{page, Player, Scoreboard, ScoreboardConfig, DEFAULT_PLAY_TO};
