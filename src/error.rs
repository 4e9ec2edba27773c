//! Error types for element construction.

/// No host node matched the selector an element was asked to bind to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no node matches selector `{selector}`")]
pub struct BindingError {
    pub selector: String,
}

impl BindingError {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into() }
    }
}

/// Errors that can occur while constructing an element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    /// The bound node could not be resolved.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// An initial state was given without a render function to display it.
    #[error("initial state provided without a render function")]
    MissingRender,
}
