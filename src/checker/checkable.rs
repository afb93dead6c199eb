// src/checker/checkable.rs
// =============================================================================
// The outcome of a "can this be checked?" decision.
//
// A CheckableValue is built fresh for every evaluation and consumed right
// away by the caller. It is never stored.
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckableValue {
    /// The candidate, possibly rewritten along the way
    pub value: String,
    /// Eligible for a network check?
    pub status: bool,
    /// Why the value is or isn't checkable
    pub message: String,
    /// First evaluation of this exact value during the run?
    pub unique: bool,
}

impl CheckableValue {
    /// A fresh, not yet decided value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status: false,
            message: String::new(),
            unique: true,
        }
    }

    pub fn skip(mut self, message: impl Into<String>) -> Self {
        self.status = false;
        self.message = message.into();
        self
    }

    pub fn accept(mut self) -> Self {
        self.status = true;
        self.message.clear();
        self
    }

    pub fn is_checkable(&self) -> bool {
        self.status
    }
}
